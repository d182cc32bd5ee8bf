//! Codepad Core - data layer for the Codepad practice editor
//!
//! This crate holds everything the editor widget and the catalog server share:
//! error types, configuration, per-session code persistence, the execution
//! wire format, progress aggregation and the task/template catalog.

pub mod catalog;
pub mod config;
pub mod error;
pub mod progress;
pub mod run;
pub mod store;

// Re-export commonly used types
pub use catalog::{Catalog, Problem, TaskItem, TemplateItem};
pub use config::{Config, EditorConfig, ServerConfig, ValidationResult};
pub use error::{CodepadError, ErrorSeverity, Result};
pub use progress::{aggregate, ProgressSummary};
pub use run::{RunRequest, RunResponse, TestCaseResult};
pub use store::{
    is_saved, FileStorage, KeyValueSessionStore, MemoryStorage, SessionKey, SessionStore,
    StorageBackend,
};
