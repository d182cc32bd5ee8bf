//! Clipboard writes with a legacy fallback

use std::sync::Arc;

use crate::host::{Clipboard, LegacyClipboard};

/// Which mechanism, if any, placed the text on the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Primary,
    Legacy,
    Failed,
}

impl CopyOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, CopyOutcome::Failed)
    }
}

/// Primary clipboard capability plus the legacy select-and-copy path
#[derive(Clone)]
pub struct ClipboardAccess {
    primary: Arc<dyn Clipboard>,
    legacy: Arc<dyn LegacyClipboard>,
}

impl ClipboardAccess {
    pub fn new(primary: Arc<dyn Clipboard>, legacy: Arc<dyn LegacyClipboard>) -> Self {
        Self { primary, legacy }
    }

    /// Try the primary capability, then the legacy path. Never fails.
    pub async fn copy_text(&self, text: &str) -> CopyOutcome {
        match self.primary.write_text(text).await {
            Ok(()) => return CopyOutcome::Primary,
            Err(e) => tracing::debug!("Primary clipboard write failed: {}", e),
        }

        match self.legacy.copy_via_selection(text) {
            Ok(()) => CopyOutcome::Legacy,
            Err(e) => {
                tracing::warn!("Copy failed on both clipboard paths: {}", e);
                CopyOutcome::Failed
            }
        }
    }
}
