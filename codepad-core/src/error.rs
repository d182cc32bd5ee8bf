//! Error handling for the Codepad system

use thiserror::Error;

/// Result type alias for Codepad operations
pub type Result<T> = std::result::Result<T, CodepadError>;

/// Main error type for the Codepad system
#[derive(Error, Debug)]
pub enum CodepadError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistent storage errors (quota, unavailable backend, corrupt file)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Task/template catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Editor adapter construction or operation errors
    #[error("Editor adapter error: {0}")]
    Adapter(String),

    /// Clipboard access errors
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Remote execution request errors
    #[error("Execution error: {0}")]
    Execution(String),

    /// Network/server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("Error: {0}")]
    Generic(String),
}

impl CodepadError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new catalog error
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a new adapter error
    pub fn adapter<S: Into<String>>(msg: S) -> Self {
        Self::Adapter(msg.into())
    }

    /// Create a new clipboard error
    pub fn clipboard<S: Into<String>>(msg: S) -> Self {
        Self::Clipboard(msg.into())
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a new server error
    pub fn server<S: Into<String>>(msg: S) -> Self {
        Self::Server(msg.into())
    }

    /// Create a generic error
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Self::Generic(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors leave the page usable: the caller degrades
    /// (fallback editor, legacy clipboard, "save had no effect") instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CodepadError::Config(_) => false,
            CodepadError::Storage(_) => true,
            CodepadError::Catalog(_) => false,
            CodepadError::Adapter(_) => true,
            CodepadError::Clipboard(_) => true,
            CodepadError::Execution(_) => true,
            CodepadError::Server(_) => true,
            CodepadError::Io(_) => true,
            CodepadError::Json(_) => false,
            CodepadError::Generic(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CodepadError::Config(_) => ErrorSeverity::High,
            CodepadError::Storage(_) => ErrorSeverity::Medium,
            CodepadError::Catalog(_) => ErrorSeverity::High,
            CodepadError::Adapter(_) => ErrorSeverity::Low,
            CodepadError::Clipboard(_) => ErrorSeverity::Low,
            CodepadError::Execution(_) => ErrorSeverity::Medium,
            CodepadError::Server(_) => ErrorSeverity::High,
            CodepadError::Io(_) => ErrorSeverity::Medium,
            CodepadError::Json(_) => ErrorSeverity::Low,
            CodepadError::Generic(_) => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
