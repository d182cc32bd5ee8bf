//! Rich editor variant backed by an asynchronously loaded editing component

use async_trait::async_trait;
use codepad_core::{EditorConfig, Result};
use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterKind, ChangeListener, EditorAdapter};
use crate::host::HostRegion;

/// Features requested from the rich editing component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichEditorSpec {
    /// Syntax highlighting language
    pub language: String,
    pub line_numbers: bool,
    pub line_wrapping: bool,
    pub highlight_active_line: bool,
    /// Bind Tab to "insert indent" instead of focus navigation
    pub indent_with_tab: bool,
    /// Modules to acquire before construction
    pub modules: Vec<String>,
}

impl RichEditorSpec {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            language: config.language.clone(),
            line_numbers: config.line_numbers,
            line_wrapping: config.line_wrapping,
            highlight_active_line: config.highlight_active_line,
            indent_with_tab: true,
            modules: config.rich_modules.clone(),
        }
    }
}

impl Default for RichEditorSpec {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

/// A document change: replace characters `[from, to)` with `insert`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl ChangeSet {
    /// Change replacing a whole document of `len` characters
    pub fn replace_all(len: usize, insert: impl Into<String>) -> Self {
        Self {
            from: 0,
            to: len,
            insert: insert.into(),
        }
    }
}

/// A constructed rich editing component living in a host region
pub trait EditorComponent: Send {
    /// Full document text
    fn doc(&self) -> String;

    /// Document length in characters
    fn doc_len(&self) -> usize;

    /// Apply one change as a single transaction
    fn dispatch(&mut self, change: ChangeSet);

    /// Register a listener fired after every document mutation
    fn subscribe(&mut self, listener: ChangeListener);

    fn focus(&mut self);

    fn destroy(&mut self);
}

/// Acquires the rich component's code and constructs it in a host region
#[async_trait]
pub trait RichEditorLoader: Send + Sync {
    async fn load(
        &self,
        host: &HostRegion,
        spec: &RichEditorSpec,
        initial: &str,
    ) -> Result<Box<dyn EditorComponent>>;
}

/// [`EditorAdapter`] over a loaded [`EditorComponent`]
pub struct RichEditor {
    component: Box<dyn EditorComponent>,
    destroyed: bool,
}

impl RichEditor {
    /// Load and construct the rich editor.
    ///
    /// Fails when the loader cannot acquire or construct the component; the
    /// caller decides what to fall back to.
    pub async fn create(
        loader: &dyn RichEditorLoader,
        host: &HostRegion,
        spec: &RichEditorSpec,
        initial: &str,
        on_change: ChangeListener,
    ) -> Result<Self> {
        tracing::debug!(
            "Loading rich editor into '{}' ({} modules, language {})",
            host.id,
            spec.modules.len(),
            spec.language
        );

        let mut component = loader.load(host, spec, initial).await?;
        component.subscribe(on_change);

        Ok(Self {
            component,
            destroyed: false,
        })
    }
}

impl EditorAdapter for RichEditor {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Rich
    }

    fn get_value(&self) -> String {
        self.component.doc()
    }

    fn set_value(&mut self, text: &str) {
        if self.destroyed {
            return;
        }
        let change = ChangeSet::replace_all(self.component.doc_len(), text);
        self.component.dispatch(change);
        self.component.focus();
    }

    fn focus(&mut self) {
        if !self.destroyed {
            self.component.focus();
        }
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.component.destroy();
            self.destroyed = true;
        }
    }
}
