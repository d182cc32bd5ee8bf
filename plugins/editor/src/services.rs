//! Shared services handed to every session controller on a page

use codepad_core::{EditorConfig, SessionStore};
use std::sync::Arc;

use crate::clipboard::ClipboardAccess;
use crate::dispatcher::{ExecutionClient, RunDispatcher};
use crate::fullscreen::FullscreenRegistry;
use crate::host::{FrameScheduler, PageView};
use crate::notify::Notifier;
use crate::rich::{RichEditorLoader, RichEditorSpec};

/// Page-level services, cheap to clone
#[derive(Clone)]
pub struct EditorServices {
    pub store: Arc<dyn SessionStore>,
    pub notifier: Arc<Notifier>,
    pub clipboard: ClipboardAccess,
    pub frames: Arc<dyn FrameScheduler>,
    pub page: Arc<dyn PageView>,
    pub fullscreen: Arc<FullscreenRegistry>,
    /// Rich editor loader; without one every shell uses the fallback
    pub loader: Option<Arc<dyn RichEditorLoader>>,
    /// Run dispatcher; without one Run reports an error
    pub dispatcher: Option<RunDispatcher>,
    pub rich_spec: RichEditorSpec,
    pub indent_width: usize,
}

impl EditorServices {
    pub fn new(
        config: &EditorConfig,
        store: Arc<dyn SessionStore>,
        notifier: Arc<Notifier>,
        clipboard: ClipboardAccess,
        frames: Arc<dyn FrameScheduler>,
        page: Arc<dyn PageView>,
    ) -> Self {
        Self {
            store,
            notifier,
            clipboard,
            frames,
            page,
            fullscreen: Arc::new(FullscreenRegistry::new()),
            loader: None,
            dispatcher: None,
            rich_spec: RichEditorSpec::from_config(config),
            indent_width: config.indent_width,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn RichEditorLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_executor(mut self, client: Arc<dyn ExecutionClient>) -> Self {
        self.dispatcher = Some(RunDispatcher::new(client));
        self
    }
}
