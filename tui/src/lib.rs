// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod exit;

mod app_event;
mod app_event_sender;
mod bottom_pane;
mod clipboard_paste;
mod composer_app;
mod host;
mod host_settings;
mod image_encode;
mod key_hint;
mod render;
mod style;
mod theme;
mod tui;
mod ui_consts;

pub use bottom_pane::ActionButton;
pub use bottom_pane::ChatComposer;
pub use bottom_pane::ComposerParams;
pub use bottom_pane::InputResult;
pub use composer_app::ComposerAppParams;
pub use composer_app::run_composer_app;
pub use exit::AppExitInfo;
pub use exit::ExitReason;
pub use host::ConversationHost;
pub use host::deliver;
pub use host_settings::HostSettings;
pub use host_settings::StaticHostSettings;
pub use image_encode::DataUrlResizer;
pub use image_encode::EncodeImageError;
pub use image_encode::ImageResizer;
pub use image_encode::encode_file;
pub use key_hint::KeyBinding;
pub use theme::Theme;
pub use tui::Tui;
pub use tui::init as init_terminal;
pub use tui::restore as restore_terminal;

pub mod keys {
    //! Key binding constructors for hosts that add their own action buttons.
    pub use crate::key_hint::alt;
    pub use crate::key_hint::ctrl;
    pub use crate::key_hint::plain;
    pub use crate::key_hint::shift;
}
