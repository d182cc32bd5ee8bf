//! Task and template catalog loaded from the site data directory
//!
//! The data directory holds `templates.json` (`{"templates": [...]}`) and
//! `tasks.json` (`{"tasks": [...]}`). Literal `\n` sequences in any string are
//! turned into real newlines so double-escaped data still reads correctly.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CodepadError, Result};

/// Code template shown on the templates pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Practice task grouping one or more problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub problems: Vec<Problem>,
}

impl TaskItem {
    /// Ids of the task's problems in declaration order
    pub fn problem_ids(&self) -> Vec<&str> {
        self.problems.iter().map(|p| p.id.as_str()).collect()
    }
}

/// One editable problem inside a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default, alias = "starter_code")]
    pub starter: String,
    #[serde(default)]
    pub start_empty: bool,
}

#[derive(Debug, Deserialize)]
struct TemplatesFile {
    #[serde(default)]
    templates: Vec<TemplateItem>,
}

#[derive(Debug, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<TaskItem>,
}

/// Loaded catalog with id indexes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<TemplateItem>,
    tasks: Vec<TaskItem>,
    template_index: HashMap<String, usize>,
    task_index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already parsed items
    pub fn new(mut templates: Vec<TemplateItem>, mut tasks: Vec<TaskItem>) -> Self {
        templates.sort_by(|a, b| compare_ids(&a.id, &b.id));
        tasks.sort_by(|a, b| compare_ids(&a.id, &b.id));

        let template_index = templates
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();
        let task_index = tasks
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();

        Self {
            templates,
            tasks,
            template_index,
            task_index,
        }
    }

    /// Load `templates.json` and `tasks.json` from a data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        let templates: TemplatesFile = load_json(&data_dir.join("templates.json"))?;
        let tasks: TasksFile = load_json(&data_dir.join("tasks.json"))?;

        let catalog = Self::new(templates.templates, tasks.tasks);
        tracing::info!(
            "Loaded catalog from {}: {} templates, {} tasks",
            data_dir.display(),
            catalog.templates.len(),
            catalog.tasks.len()
        );
        Ok(catalog)
    }

    /// Templates ordered by numeric id
    pub fn templates(&self) -> &[TemplateItem] {
        &self.templates
    }

    /// Tasks ordered by numeric id
    pub fn tasks(&self) -> &[TaskItem] {
        &self.tasks
    }

    /// Look up a template by id
    pub fn template(&self, id: &str) -> Option<&TemplateItem> {
        self.template_index.get(id).map(|&i| &self.templates[i])
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Option<&TaskItem> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }
}

/// Read a JSON data file, normalizing escaped newlines before parsing into `T`
fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CodepadError::Catalog(format!(
            "Missing data file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let mut value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        CodepadError::Catalog(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    normalize_newlines(&mut value);

    serde_json::from_value(value)
        .map_err(|e| CodepadError::Catalog(format!("Invalid data in {}: {}", path.display(), e)))
}

/// Replace literal `\n` sequences with newlines in every string of a JSON tree
pub fn normalize_newlines(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            if s.contains("\\n") {
                *s = s.replace("\\n", "\n");
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(normalize_newlines),
        serde_json::Value::Object(map) => map.values_mut().for_each(normalize_newlines),
        _ => {}
    }
}

/// Numeric ids sort numerically and before non-numeric ones
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {}",
            other
        ))),
    }
}
