//! Bottom-pane widgets: the message composer and the hint footer under it.
//!
//! `ChatComposer` owns the draft, the single image attachment slot, and the submission gate.
//! The footer and action buttons are pure rendering helpers driven by the composer.

mod action_button;
mod chat_composer;
mod footer;
mod textarea;

pub use action_button::ActionButton;
pub use chat_composer::ChatComposer;
pub use chat_composer::ComposerParams;
pub use chat_composer::DEFAULT_MAX_INPUT_HEIGHT;
pub use chat_composer::InputResult;

/// How long the "press again to quit" hint stays visible.
pub const QUIT_SHORTCUT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);
