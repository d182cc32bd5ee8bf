//! Codepad editor widget
//!
//! Turns each editor shell on a page into a working code editor with per-problem
//! persistence, a saved indicator, reset, copy, fullscreen and remote test runs.
//!
//! The host environment is reached only through the traits in [`host`],
//! [`rich`] and [`notify`]. With the `test-support` feature, `headless`
//! implements all of them in memory.

use codepad_core::CodepadError;
use uuid::Uuid;

pub mod adapter;
pub mod clipboard;
pub mod controller;
pub mod dispatcher;
pub mod fallback;
pub mod fullscreen;
#[cfg(any(test, feature = "test-support"))]
pub mod headless;
pub mod host;
pub mod notify;
pub mod page;
pub mod render;
pub mod rich;
pub mod services;

pub use adapter::{AdapterKind, ChangeListener, EditorAdapter};
pub use clipboard::{ClipboardAccess, CopyOutcome};
pub use controller::{normalize_template, ActionOutcome, SessionController, SessionPhase};
pub use dispatcher::{ExecutionClient, HttpExecutionClient, RunDispatcher};
pub use fallback::FallbackEditor;
pub use fullscreen::{FullscreenRegistry, Takeover};
pub use host::{
    Clipboard, FrameScheduler, HostRegion, Key, KeyHandling, KeyPress, LegacyClipboard, PageView,
    SavedBadge, ShellControl, ShellMarkup, ShellView, TextInput,
};
pub use notify::{Notifier, SurfaceFactory, ToastSurface, MSG_COPIED, MSG_RESET, MSG_SAVED};
pub use page::Page;
pub use render::{ResultRenderer, GENERIC_RUN_ERROR, RUNNING_STATUS};
pub use rich::{ChangeSet, EditorComponent, RichEditor, RichEditorLoader, RichEditorSpec};
pub use services::EditorServices;

/// Editor-specific errors
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("No editor shell at index {0}")]
    ShellNotFound(usize),

    #[error("Invalid shell markup: {0}")]
    InvalidMarkup(String),

    #[error("Rich editor unavailable: {0}")]
    RichEditorUnavailable(String),
}

impl From<EditorError> for CodepadError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::RichEditorUnavailable(msg) => CodepadError::Adapter(msg),
            other => CodepadError::Generic(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_conversion() {
        let err: CodepadError = EditorError::RichEditorUnavailable("offline".to_string()).into();
        assert!(matches!(err, CodepadError::Adapter(_)));

        let err: CodepadError = EditorError::ShellNotFound(2).into();
        assert_eq!(err.to_string(), "Error: No editor shell at index 2");
    }
}
