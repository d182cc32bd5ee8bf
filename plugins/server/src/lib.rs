//! Catalog HTTP server
//!
//! Serves the task and template catalog as a JSON API. Handlers implement
//! [`HttpHandler`] and are looked up through a [`HandlerRegistry`] from a
//! single catch-all axum route, so new endpoints only need registering.

pub mod handlers;

use async_trait::async_trait;
use axum::{
    extract::Query,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use codepad_core::{Catalog, CodepadError, Result, ServerConfig};
use serde::Serialize;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::handlers::{SummaryHandler, TaskHandler, TaskListHandler, TemplateHandler, TemplateListHandler};

/// HTTP handler trait for processing HTTP requests
#[async_trait]
pub trait HttpHandler: Send + Sync {
    /// Path pattern; `{name}` segments capture path parameters
    fn path_pattern(&self) -> &str;

    /// HTTP method this handler supports
    fn method(&self) -> Method;

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Handler priority (lower numbers = higher priority)
    fn priority(&self) -> i32 {
        0
    }

    /// Path parameters when this handler serves the request
    fn match_request(&self, path: &str, method: &Method) -> Option<HashMap<String, String>> {
        if self.method() != *method {
            return None;
        }
        match_path(self.path_pattern(), path)
    }
}

/// Match `path` against a pattern segment by segment
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_segments: Vec<&str> = pattern.trim_end_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if !actual.is_empty() => {
                params.insert(name.to_string(), actual.to_string());
            }
            Some(_) => return None,
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub path_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Bodyless GET request, mostly for driving handlers directly
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query_params: HashMap::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
        }
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.query_params.insert(name.to_string(), value.to_string());
        self
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        use axum::http::header::{HeaderName, HeaderValue};
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// JSON response with status 200
    pub fn json<T: Serialize>(data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data)
            .map_err(|e| CodepadError::server(format!("JSON serialization failed: {}", e)))?;

        Ok(Self::new(StatusCode::OK)
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// JSON `{"error": message}` body
    pub fn json_error(status: StatusCode, message: &str) -> Result<Self> {
        Ok(Self::json(&serde_json::json!({ "error": message }))?.with_status(status))
    }

    pub fn text(content: &str) -> Self {
        Self::new(StatusCode::OK)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(content.as_bytes())
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(message.as_bytes())
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Registry of HTTP handlers, kept sorted by priority
#[derive(Default)]
pub struct HandlerRegistry {
    http_handlers: RwLock<Vec<Arc<dyn HttpHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_http_handler(&self, handler: Arc<dyn HttpHandler>) {
        info!(
            "Registering HTTP handler: {} {}",
            handler.method(),
            handler.path_pattern()
        );

        let mut handlers = self.http_handlers.write().await;
        handlers.push(handler);
        handlers.sort_by_key(|h| h.priority());
    }

    pub async fn unregister_http_handler(&self, path: &str, method: &Method) -> bool {
        let mut handlers = self.http_handlers.write().await;
        let before = handlers.len();
        handlers.retain(|h| !(h.path_pattern() == path && h.method() == *method));
        before != handlers.len()
    }

    /// Handler serving a request, with the captured path parameters
    pub async fn find_http_handler(
        &self,
        path: &str,
        method: &Method,
    ) -> Option<(Arc<dyn HttpHandler>, HashMap<String, String>)> {
        let handlers = self.http_handlers.read().await;
        handlers.iter().find_map(|handler| {
            handler
                .match_request(path, method)
                .map(|params| (handler.clone(), params))
        })
    }

    /// (pattern, method, priority) of every registered handler
    pub async fn list_http_handlers(&self) -> Vec<(String, Method, i32)> {
        let handlers = self.http_handlers.read().await;
        handlers
            .iter()
            .map(|h| (h.path_pattern().to_string(), h.method(), h.priority()))
            .collect()
    }

    pub async fn clear_all_handlers(&self) {
        self.http_handlers.write().await.clear();
        info!("Cleared all registered handlers");
    }
}

/// HTTP server exposing a [`Catalog`]
pub struct CatalogServer {
    config: ServerConfig,
    catalog: Arc<Catalog>,
    registry: Arc<HandlerRegistry>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CatalogServer {
    /// Server with the catalog endpoints registered
    pub async fn new(config: ServerConfig, catalog: Catalog) -> Self {
        let server = Self {
            config,
            catalog: Arc::new(catalog),
            registry: Arc::new(HandlerRegistry::new()),
            server_handle: None,
        };
        server.register_catalog_handlers().await;
        server
    }

    pub fn registry(&self) -> Arc<HandlerRegistry> {
        self.registry.clone()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    async fn register_catalog_handlers(&self) {
        let catalog = &self.catalog;
        let handlers: Vec<Arc<dyn HttpHandler>> = vec![
            Arc::new(SummaryHandler::new(
                self.config.site_name.clone(),
                catalog.clone(),
            )),
            Arc::new(TemplateListHandler::new(catalog.clone())),
            Arc::new(TemplateHandler::new(catalog.clone())),
            Arc::new(TaskListHandler::new(catalog.clone())),
            Arc::new(TaskHandler::new(catalog.clone())),
        ];

        for handler in handlers {
            self.registry.register_http_handler(handler).await;
        }
    }

    /// Axum router dispatching every request through the registry
    pub fn router(&self) -> Router {
        let registry = self.registry.clone();
        let router = Router::new().fallback(move |req| {
            let registry = registry.clone();
            async move { Self::handle_http_request(req, registry).await }
        });

        if self.config.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    async fn handle_http_request(req: axum::extract::Request, registry: Arc<HandlerRegistry>) -> Response {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let path = uri.path().to_string();
        let headers = req.headers().clone();

        let query_params = Query::<HashMap<String, String>>::try_from_uri(&uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        let Some((handler, path_params)) = registry.find_http_handler(&path, &method).await else {
            tracing::debug!("No handler found for {} {}", method, path);
            return HttpResponse::error(StatusCode::NOT_FOUND, "Not found").into_response();
        };

        let (_parts, body) = req.into_parts();
        let body = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes.to_vec(),
            Err(_) => Vec::new(),
        };

        let request = HttpRequest {
            method: method.clone(),
            path: path.clone(),
            query_params,
            headers,
            body,
            path_params,
        };

        match handler.handle(request).await {
            Ok(response) => response.into_response(),
            Err(e) => {
                error!("Handler error for {} {}: {}", method, path, e);
                HttpResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response()
            }
        }
    }

    /// Bind the configured address and serve in the background
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.config.hostname, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CodepadError::server(format!("Failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        self.server_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("Server error: {}", e);
            }
        }));

        info!("Catalog server listening on http://{}", local_addr);
        Ok(local_addr)
    }

    /// Stop serving and drop every handler
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
        self.registry.clear_all_handlers().await;
        info!("Catalog server stopped");
    }
}
