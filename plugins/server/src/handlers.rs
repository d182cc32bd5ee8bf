//! Catalog endpoint handlers

use crate::{HttpHandler, HttpRequest, HttpResponse};
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use codepad_core::{Catalog, Result, TaskItem, TemplateItem};
use serde::Serialize;
use std::sync::Arc;

/// `GET /api/summary`: site name and catalog sizes
pub struct SummaryHandler {
    site_name: String,
    catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    site_name: &'a str,
    templates_count: usize,
    tasks_count: usize,
}

impl SummaryHandler {
    pub fn new(site_name: String, catalog: Arc<Catalog>) -> Self {
        Self { site_name, catalog }
    }
}

#[async_trait]
impl HttpHandler for SummaryHandler {
    fn path_pattern(&self) -> &str {
        "/api/summary"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        HttpResponse::json(&Summary {
            site_name: &self.site_name,
            templates_count: self.catalog.templates().len(),
            tasks_count: self.catalog.tasks().len(),
        })
    }
}

/// `GET /api/templates[?tag=...]`
pub struct TemplateListHandler {
    catalog: Arc<Catalog>,
}

impl TemplateListHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl HttpHandler for TemplateListHandler {
    fn path_pattern(&self) -> &str {
        "/api/templates"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let templates: Vec<&TemplateItem> = match request.query_params.get("tag") {
            Some(tag) => self
                .catalog
                .templates()
                .iter()
                .filter(|t| t.tags.iter().any(|candidate| candidate == tag))
                .collect(),
            None => self.catalog.templates().iter().collect(),
        };
        HttpResponse::json(&templates)
    }
}

/// `GET /api/templates/{id}`
pub struct TemplateHandler {
    catalog: Arc<Catalog>,
}

impl TemplateHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl HttpHandler for TemplateHandler {
    fn path_pattern(&self) -> &str {
        "/api/templates/{id}"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let id = request.path_params.get("id").map(String::as_str).unwrap_or_default();
        match self.catalog.template(id) {
            Some(template) => HttpResponse::json(template),
            None => {
                tracing::debug!("Template {} not found", id);
                HttpResponse::json_error(StatusCode::NOT_FOUND, &format!("Template not found: {}", id))
            }
        }
    }
}

/// `GET /api/tasks`: tasks without their problems
pub struct TaskListHandler {
    catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
struct TaskSummary<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    problem_count: usize,
}

impl TaskListHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl HttpHandler for TaskListHandler {
    fn path_pattern(&self) -> &str {
        "/api/tasks"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        let tasks: Vec<TaskSummary> = self
            .catalog
            .tasks()
            .iter()
            .map(|task| TaskSummary {
                id: &task.id,
                title: &task.title,
                description: &task.description,
                problem_count: task.problems.len(),
            })
            .collect();
        HttpResponse::json(&tasks)
    }
}

/// `GET /api/tasks/{id}`: full task with problems and starter code
pub struct TaskHandler {
    catalog: Arc<Catalog>,
}

impl TaskHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl HttpHandler for TaskHandler {
    fn path_pattern(&self) -> &str {
        "/api/tasks/{id}"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let id = request.path_params.get("id").map(String::as_str).unwrap_or_default();
        let task: Option<&TaskItem> = self.catalog.task(id);
        match task {
            Some(task) => HttpResponse::json(task),
            None => {
                tracing::debug!("Task {} not found", id);
                HttpResponse::json_error(StatusCode::NOT_FOUND, &format!("Task not found: {}", id))
            }
        }
    }
}
