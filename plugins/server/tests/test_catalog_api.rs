use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use codepad_core::{Catalog, ServerConfig};
use codepad_server::CatalogServer;
use serde_json::Value;
use std::path::Path;
use tower::ServiceExt;

const TEMPLATES: &str = r#"{
  "templates": [
    {"id": 10, "title": "Union find", "code": "parent = {}\\nrank = {}", "tags": ["graph"]},
    {"id": 2, "title": "Binary search", "code": "lo, hi = 0, n", "tags": ["search"]}
  ]
}"#;

const TASKS: &str = r#"{
  "tasks": [
    {
      "id": "1",
      "title": "Warmup",
      "problems": [
        {"id": "a", "title": "Echo", "statement": "Read a line\\nand print it", "starter_code": "print(input())"},
        {"id": "b", "title": "Sum", "start_empty": true}
      ]
    }
  ]
}"#;

fn write_data(dir: &Path) {
    std::fs::write(dir.join("templates.json"), TEMPLATES).unwrap();
    std::fs::write(dir.join("tasks.json"), TASKS).unwrap();
}

async fn test_server(cors_enabled: bool) -> (CatalogServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    write_data(dir.path());

    let config = ServerConfig {
        data_dir: dir.path().to_path_buf(),
        site_name: "Practice".to_string(),
        cors_enabled,
        ..ServerConfig::default()
    };
    let catalog = Catalog::load(&config.data_dir).unwrap();
    (CatalogServer::new(config, catalog).await, dir)
}

#[tokio::test]
async fn test_summary_endpoint() {
    let (server, _dir) = test_server(true).await;
    let client = TestServer::new(server.router()).unwrap();

    let response = client.get("/api/summary").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["site_name"], "Practice");
    assert_eq!(body["templates_count"], 2);
    assert_eq!(body["tasks_count"], 1);
}

#[tokio::test]
async fn test_templates_sorted_numerically() {
    let (server, _dir) = test_server(true).await;
    let client = TestServer::new(server.router()).unwrap();

    let body: Value = client.get("/api/templates").await.json();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "10"]);
    assert_eq!(body[1]["code"], "parent = {}\nrank = {}");
}

#[tokio::test]
async fn test_template_tag_query() {
    let (server, _dir) = test_server(true).await;
    let client = TestServer::new(server.router()).unwrap();

    let body: Value = client
        .get("/api/templates")
        .add_query_param("tag", "graph")
        .await
        .json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Union find");
}

#[tokio::test]
async fn test_task_detail_and_missing_ids() {
    let (server, _dir) = test_server(true).await;
    let client = TestServer::new(server.router()).unwrap();

    let body: Value = client.get("/api/tasks/1").await.json();
    assert_eq!(body["problems"][0]["statement"], "Read a line\nand print it");
    assert_eq!(body["problems"][0]["starter"], "print(input())");
    assert_eq!(body["problems"][1]["start_empty"], true);

    let response = client.get("/api/tasks/404").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Task not found: 404");

    let response = client.get("/api/templates/7").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = client.get("/nowhere").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_follows_config() {
    let request = || {
        Request::builder()
            .uri("/api/summary")
            .header("origin", "http://localhost:8080")
            .body(Body::empty())
            .unwrap()
    };

    let (server, _dir) = test_server(true).await;
    let response = server.router().oneshot(request()).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let (server, _dir) = test_server(false).await;
    let response = server.router().oneshot(request()).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_missing_data_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("templates.json"), TEMPLATES).unwrap();

    let err = Catalog::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("Missing data file"));
    assert!(err.to_string().contains("tasks.json"));
}

#[tokio::test]
async fn test_start_and_shutdown() {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let mut server = CatalogServer::new(config, Catalog::default()).await;
    let addr = server.start().await.unwrap();
    assert_ne!(addr.port(), 0);

    server.shutdown().await;
    assert!(server.registry().list_http_handlers().await.is_empty());
}
