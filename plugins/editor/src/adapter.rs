//! Uniform capability interface over the rich and fallback editors

use std::sync::Arc;

use crate::host::{KeyHandling, KeyPress};

/// Callback invoked with the full document after every mutation
pub type ChangeListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Which editor implementation backs an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Rich,
    Fallback,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Rich => write!(f, "rich"),
            AdapterKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Editor capability surface used by the session controller
pub trait EditorAdapter: Send {
    /// Implementation behind this adapter
    fn kind(&self) -> AdapterKind;

    /// Current text buffer
    fn get_value(&self) -> String;

    /// Replace the whole buffer and re-focus
    fn set_value(&mut self, text: &str);

    fn focus(&mut self);

    /// Release resources held by the implementation; further calls are no-ops
    fn destroy(&mut self);

    /// Offer a key press to the editor before the host's default handling
    fn handle_key(&mut self, _key: &KeyPress) -> KeyHandling {
        KeyHandling::Default
    }

    /// The host saw the user edit the buffer outside the adapter's own
    /// transactions
    fn handle_input(&mut self) {}
}

/// Replace the character range `[start, end)` of `text` with `insert`.
///
/// Offsets are in characters, clamped to the text and reordered if reversed.
/// Returns the new text and the character offset just past the insertion.
pub fn splice_chars(text: &str, start: usize, end: usize, insert: &str) -> (String, usize) {
    let char_count = text.chars().count();
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let start = start.min(char_count);
    let end = end.min(char_count);

    let byte_at = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    let (start_byte, end_byte) = (byte_at(start), byte_at(end));

    let mut result = String::with_capacity(text.len() - (end_byte - start_byte) + insert.len());
    result.push_str(&text[..start_byte]);
    result.push_str(insert);
    result.push_str(&text[end_byte..]);

    (result, start + insert.chars().count())
}
