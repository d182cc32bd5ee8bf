//! Plain-text fallback editor used when the rich editor cannot load

use crate::adapter::{splice_chars, AdapterKind, ChangeListener, EditorAdapter};
use crate::host::{Key, KeyHandling, KeyPress, TextInput};

/// [`EditorAdapter`] over a host [`TextInput`] with manual Tab-as-indent
pub struct FallbackEditor {
    input: Box<dyn TextInput>,
    indent: String,
    on_change: ChangeListener,
    destroyed: bool,
}

impl FallbackEditor {
    /// Take over a text input, filling it with the initial content
    pub fn new(
        mut input: Box<dyn TextInput>,
        initial: &str,
        indent_width: usize,
        on_change: ChangeListener,
    ) -> Self {
        input.set_value(initial);
        Self {
            input,
            indent: " ".repeat(indent_width),
            on_change,
            destroyed: false,
        }
    }

    /// Insert the indent at the cursor, replacing any selection, and place
    /// the cursor right after it
    pub fn insert_indent(&mut self) {
        let (start, end) = self.input.selection();
        let (value, cursor) = splice_chars(&self.input.value(), start, end, &self.indent);
        self.input.set_value(&value);
        self.input.set_selection(cursor, cursor);
        (self.on_change)(&value);
    }
}

impl EditorAdapter for FallbackEditor {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Fallback
    }

    fn get_value(&self) -> String {
        self.input.value()
    }

    fn set_value(&mut self, text: &str) {
        if self.destroyed {
            return;
        }
        self.input.set_value(text);
        (self.on_change)(text);
        self.input.focus();
    }

    fn focus(&mut self) {
        if !self.destroyed {
            self.input.focus();
        }
    }

    fn destroy(&mut self) {
        // the input belongs to the page; nothing to release
        self.destroyed = true;
    }

    fn handle_input(&mut self) {
        if !self.destroyed {
            (self.on_change)(&self.input.value());
        }
    }

    fn handle_key(&mut self, key: &KeyPress) -> KeyHandling {
        if self.destroyed || key.key != Key::Tab || key.has_modifiers() {
            return KeyHandling::Default;
        }
        self.insert_indent();
        KeyHandling::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryTextInput;
    use std::sync::{Arc, Mutex};

    fn editor_with(input: &MemoryTextInput, initial: &str) -> FallbackEditor {
        FallbackEditor::new(Box::new(input.clone()), initial, 4, Arc::new(|_: &str| {}))
    }

    #[test]
    fn test_tab_inserts_indent_at_cursor() {
        let input = MemoryTextInput::new();
        let mut editor = editor_with(&input, "ab");
        input.select(1, 1);

        let handling = editor.handle_key(&KeyPress::plain(Key::Tab));

        assert_eq!(handling, KeyHandling::Handled);
        assert_eq!(editor.get_value(), "a    b");
        assert_eq!(input.selection_range(), (5, 5));
    }

    #[test]
    fn test_tab_replaces_selection() {
        let input = MemoryTextInput::new();
        let mut editor = editor_with(&input, "abcd");
        input.select(1, 3);

        editor.handle_key(&KeyPress::plain(Key::Tab));

        assert_eq!(editor.get_value(), "a    d");
        assert_eq!(input.selection_range(), (5, 5));
    }

    #[test]
    fn test_shift_tab_and_other_keys_are_not_consumed() {
        let input = MemoryTextInput::new();
        let mut editor = editor_with(&input, "ab");

        let mut shift_tab = KeyPress::plain(Key::Tab);
        shift_tab.shift = true;
        assert_eq!(editor.handle_key(&shift_tab), KeyHandling::Default);
        assert_eq!(
            editor.handle_key(&KeyPress::plain(Key::Character('x'))),
            KeyHandling::Default
        );
        assert_eq!(editor.get_value(), "ab");
    }

    #[test]
    fn test_set_value_refocuses_and_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let input = MemoryTextInput::new();
        let mut editor = FallbackEditor::new(
            Box::new(input.clone()),
            "start",
            4,
            Arc::new(move |doc: &str| sink.lock().unwrap().push(doc.to_string())),
        );

        editor.set_value("next");

        assert_eq!(input.text(), "next");
        assert!(input.is_focused());
        assert_eq!(*seen.lock().unwrap(), vec!["next".to_string()]);
    }

    #[test]
    fn test_user_input_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let input = MemoryTextInput::new();
        let mut editor = FallbackEditor::new(
            Box::new(input.clone()),
            "",
            4,
            Arc::new(move |doc: &str| sink.lock().unwrap().push(doc.to_string())),
        );

        input.type_text("pri");
        editor.handle_input();
        editor.destroy();
        input.type_text("print");
        editor.handle_input();

        assert_eq!(*seen.lock().unwrap(), vec!["pri".to_string()]);
    }
}
