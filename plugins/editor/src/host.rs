//! Host environment primitives the session controller talks to
//!
//! A host (browser binding, desktop shell, headless harness) implements these
//! traits; the controller never touches markup, storage or the clipboard
//! directly.

use async_trait::async_trait;
use codepad_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::EditorError;

/// Action control roles a shell may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShellControl {
    Save,
    Reset,
    Copy,
    Run,
    Fullscreen,
    ExitFullscreen,
}

impl ShellControl {
    /// Every control role
    pub const ALL: [ShellControl; 6] = [
        ShellControl::Save,
        ShellControl::Reset,
        ShellControl::Copy,
        ShellControl::Run,
        ShellControl::Fullscreen,
        ShellControl::ExitFullscreen,
    ];

    /// Parse the role name used in markup (`data-action="save"`)
    pub fn from_role(role: &str) -> Option<Self> {
        match role {
            "save" => Some(ShellControl::Save),
            "reset" => Some(ShellControl::Reset),
            "copy" => Some(ShellControl::Copy),
            "run" => Some(ShellControl::Run),
            "fullscreen" => Some(ShellControl::Fullscreen),
            "exit-fullscreen" => Some(ShellControl::ExitFullscreen),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShellControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            ShellControl::Save => "save",
            ShellControl::Reset => "reset",
            ShellControl::Copy => "copy",
            ShellControl::Run => "run",
            ShellControl::Fullscreen => "fullscreen",
            ShellControl::ExitFullscreen => "exit-fullscreen",
        };
        write!(f, "{}", role)
    }
}

/// Display state of the saved indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBadge {
    pub saved: bool,
}

impl SavedBadge {
    pub fn new(saved: bool) -> Self {
        Self { saved }
    }

    pub fn label(&self) -> &'static str {
        if self.saved {
            "Saved"
        } else {
            "Not saved"
        }
    }

    pub fn css_class(&self) -> &'static str {
        if self.saved {
            "ok"
        } else {
            "warn"
        }
    }
}

/// Rendering surface of one shell
pub trait ShellView: Send + Sync {
    /// Update the saved indicator region
    fn set_saved_badge(&self, badge: SavedBadge);

    /// Toggle the expanded (fullscreen) visual state
    fn set_expanded(&self, expanded: bool);

    /// Replace the contents of the run-results region
    fn set_results_html(&self, html: &str);

    /// Empty the rich editor host region after a failed load
    fn clear_rich_host(&self);

    /// Show or hide the fallback text input
    fn set_fallback_visible(&self, visible: bool);
}

/// Page-wide state shared by all shells
pub trait PageView: Send + Sync {
    /// Suppress or restore page scrolling
    fn set_scroll_locked(&self, locked: bool);
}

/// Post-layout callback primitive ("next animation frame")
#[async_trait]
pub trait FrameScheduler: Send + Sync {
    /// Resolve once the host has laid out the next frame
    async fn next_frame(&self);
}

/// Primary asynchronous clipboard capability
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Legacy copy: off-screen text container, select its content, run the copy command
pub trait LegacyClipboard: Send + Sync {
    fn copy_via_selection(&self, text: &str) -> Result<()>;
}

/// Plain multi-line text input used by the fallback editor.
///
/// Selection offsets are character offsets into the value.
pub trait TextInput: Send {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
    fn selection(&self) -> (usize, usize);
    fn set_selection(&mut self, start: usize, end: usize);
    fn focus(&mut self);
}

/// Opaque handle to the region hosting the rich editor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostRegion {
    pub id: String,
}

impl HostRegion {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Key identity of a keyboard event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    Character(char),
    Other(String),
}

/// Keyboard event forwarded by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    /// A key press without modifiers
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn has_modifiers(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Whether a key press was consumed or should get its default behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHandling {
    /// Consumed; the host must prevent the default action
    Handled,
    /// Not consumed
    Default,
}

/// Everything the controller reads from one shell's markup
pub struct ShellMarkup {
    pub task_id: String,
    pub problem_id: String,
    pub start_empty: bool,
    /// Raw starter template text, `None` when the shell has no starter region
    pub starter_source: Option<String>,
    pub rich_host: Option<HostRegion>,
    pub fallback: Option<Box<dyn TextInput>>,
    pub controls: HashSet<ShellControl>,
    pub view: Arc<dyn ShellView>,
}

impl ShellMarkup {
    /// Build a descriptor from the shell's data attributes.
    ///
    /// Recognized attributes: `data-task-id`, `data-problem-id` (required) and
    /// `data-start-empty`. Regions and controls are attached afterwards.
    pub fn from_attributes(
        attributes: &HashMap<String, String>,
        view: Arc<dyn ShellView>,
    ) -> std::result::Result<Self, EditorError> {
        let task_id = attributes
            .get("data-task-id")
            .ok_or_else(|| EditorError::InvalidMarkup("missing data-task-id".to_string()))?;
        let problem_id = attributes
            .get("data-problem-id")
            .ok_or_else(|| EditorError::InvalidMarkup("missing data-problem-id".to_string()))?;

        Ok(Self {
            task_id: task_id.clone(),
            problem_id: problem_id.clone(),
            start_empty: parse_flag(attributes.get("data-start-empty").map(String::as_str)),
            starter_source: None,
            rich_host: None,
            fallback: None,
            controls: HashSet::new(),
            view,
        })
    }

    pub fn with_starter(mut self, starter: impl Into<String>) -> Self {
        self.starter_source = Some(starter.into());
        self
    }

    pub fn with_rich_host(mut self, host: HostRegion) -> Self {
        self.rich_host = Some(host);
        self
    }

    pub fn with_fallback(mut self, input: Box<dyn TextInput>) -> Self {
        self.fallback = Some(input);
        self
    }

    pub fn with_controls(mut self, controls: impl IntoIterator<Item = ShellControl>) -> Self {
        self.controls.extend(controls);
        self
    }
}

/// Boolean attribute: present and not `"false"`/`"0"`
fn parse_flag(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessShellView;

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag(None));
        assert!(parse_flag(Some("")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("0")));
    }

    #[test]
    fn test_markup_from_attributes() {
        let mut attributes = HashMap::new();
        attributes.insert("data-task-id".to_string(), "4".to_string());
        attributes.insert("data-problem-id".to_string(), "b".to_string());
        attributes.insert("data-start-empty".to_string(), "".to_string());

        let markup = ShellMarkup::from_attributes(&attributes, Arc::new(HeadlessShellView::new()))
            .unwrap()
            .with_controls([ShellControl::Save]);

        assert_eq!(markup.task_id, "4");
        assert_eq!(markup.problem_id, "b");
        assert!(markup.start_empty);
        assert!(markup.controls.contains(&ShellControl::Save));

        attributes.remove("data-task-id");
        assert!(
            ShellMarkup::from_attributes(&attributes, Arc::new(HeadlessShellView::new())).is_err()
        );
    }

    #[test]
    fn test_control_roles() {
        for control in ShellControl::ALL {
            assert_eq!(ShellControl::from_role(&control.to_string()), Some(control));
        }
        assert_eq!(ShellControl::from_role("delete"), None);
    }
}
