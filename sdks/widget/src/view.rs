//! Rendering surface for the message log and input box.

use crate::types::{Author, Message, PLACEHOLDER_TEXT};

/// The visual side of a widget: an append-only log plus one text input.
pub trait ChatView {
    /// Append an entry styled for `author` and scroll it into view.
    fn append_entry(&mut self, author: Author, text: &str);

    /// Remove the most recently appended entry, if any.
    fn remove_last_entry(&mut self);

    /// Current raw value of the input field.
    fn input_value(&self) -> String;

    /// Empty the input field.
    fn clear_input(&mut self);
}

/// Inline style of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStyle {
    /// Bubble background color.
    pub background: &'static str,
    /// Text color.
    pub color: &'static str,
    /// `auto` pushes the bubble to the right edge.
    pub margin_left: &'static str,
}

impl EntryStyle {
    /// Style for entries written by `author`.
    #[must_use]
    pub const fn for_author(author: Author) -> Self {
        match author {
            Author::User => Self {
                background: "#b30000",
                color: "#fff",
                margin_left: "auto",
            },
            Author::Bot => Self {
                background: "#222",
                color: "#ddd",
                margin_left: "0",
            },
        }
    }

    /// CSS property/value pairs, shared layout first.
    #[must_use]
    pub fn declarations(&self) -> [(&'static str, &'static str); 7] {
        [
            ("margin", "6px 0"),
            ("padding", "8px 12px"),
            ("border-radius", "12px"),
            ("max-width", "80%"),
            ("background", self.background),
            ("color", self.color),
            ("margin-left", self.margin_left),
        ]
    }
}

/// In-memory view used natively and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    entries: Vec<Message>,
    input: String,
    scroll_position: usize,
}

impl MemoryView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate typing into the input field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Current input text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Log entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Last log entry.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// Number of entries the log is scrolled past; equals the entry count
    /// right after an append.
    #[must_use]
    pub fn scroll_position(&self) -> usize {
        self.scroll_position
    }

    /// Number of pending-reply placeholders currently shown.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.entries.iter().filter(|m| m.is_placeholder()).count()
    }
}

impl ChatView for MemoryView {
    fn append_entry(&mut self, author: Author, text: &str) {
        self.entries.push(Message::new(author, text));
        self.scroll_position = self.entries.len();
    }

    fn remove_last_entry(&mut self) {
        self.entries.pop();
        self.scroll_position = self.scroll_position.min(self.entries.len());
    }

    fn input_value(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_styles_differ() {
        let user = EntryStyle::for_author(Author::User);
        let bot = EntryStyle::for_author(Author::Bot);
        assert_ne!(user.background, bot.background);
        assert_eq!(user.margin_left, "auto");
        assert_eq!(bot.margin_left, "0");
    }

    #[test]
    fn test_append_scrolls_to_newest() {
        let mut view = MemoryView::new();
        view.append_entry(Author::User, "a");
        view.append_entry(Author::Bot, "");
        assert_eq!(view.entries().len(), 2);
        assert_eq!(view.scroll_position(), 2);
        assert_eq!(view.last().unwrap().text, "");
    }

    #[test]
    fn test_remove_last_on_empty_log() {
        let mut view = MemoryView::new();
        view.remove_last_entry();
        assert!(view.entries().is_empty());
    }

    #[test]
    fn test_placeholder_count() {
        let mut view = MemoryView::new();
        view.append_entry(Author::User, PLACEHOLDER_TEXT);
        assert_eq!(view.placeholder_count(), 0);
        view.append_entry(Author::Bot, PLACEHOLDER_TEXT);
        assert_eq!(view.placeholder_count(), 1);
    }
}
