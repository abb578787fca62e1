use crossterm::event::KeyEvent;
use ratatui::style::Stylize;
use ratatui::text::Span;

use crate::key_hint::KeyBinding;

/// A host-supplied action shown beside the composer hints.
///
/// The composer only draws it; pressing `key` is handled by whoever installed the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    key: KeyBinding,
    label: String,
}

impl ActionButton {
    pub fn new(key: KeyBinding, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }

    pub fn share(key: KeyBinding, text: &str) -> Self {
        Self::new(key, format!("🔗 {text}"))
    }

    pub fn history(key: KeyBinding, text: &str) -> Self {
        Self::new(key, text)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pressed_by(&self, event: KeyEvent) -> bool {
        self.key.is_press(event)
    }

    pub(crate) fn spans(&self) -> Vec<Span<'static>> {
        vec![
            self.key.into(),
            " ".into(),
            Span::from(self.label.clone()).dim(),
        ]
    }
}
