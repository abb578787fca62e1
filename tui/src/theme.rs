//! Light/dark theme toggle.
//!
//! There is exactly one toggle component; how the current theme is drawn is delegated to an
//! injected [`ThemeIcon`] strategy (emoji glyphs or plain labels for terminals without emoji).
//! The chosen theme lives only as long as the process and is never persisted.

use std::fmt;
use std::str::FromStr;

use crossterm::event::KeyCode;
use ratatui::style::Stylize;
use ratatui::text::Span;

use crate::bottom_pane::ActionButton;
use crate::key_hint;
use crate::key_hint::KeyBinding;

pub const THEME_TOGGLE_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('t'));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown theme `{0}` (expected `light` or `dark`)")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// Renders the toggle's icon for the theme currently in effect.
pub trait ThemeIcon {
    fn render(&self, theme: Theme) -> Span<'static>;
}

impl<T: ThemeIcon + ?Sized> ThemeIcon for Box<T> {
    fn render(&self, theme: Theme) -> Span<'static> {
        (**self).render(theme)
    }
}

/// Moon while light (switch to dark), sun while dark.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphIcon;

impl ThemeIcon for GlyphIcon {
    fn render(&self, theme: Theme) -> Span<'static> {
        match theme {
            Theme::Light => Span::from("🌙"),
            Theme::Dark => Span::from("☀️"),
        }
    }
}

/// Plain-text icon naming the theme the toggle switches to.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelIcon;

impl ThemeIcon for LabelIcon {
    fn render(&self, theme: Theme) -> Span<'static> {
        theme.toggled().as_str().bold()
    }
}

pub struct ThemeToggle<I: ThemeIcon> {
    theme: Theme,
    icon: I,
}

impl<I: ThemeIcon> ThemeToggle<I> {
    pub fn new(theme: Theme, icon: I) -> Self {
        Self { theme, icon }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and return the new one.
    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        tracing::debug!("theme switched to {}", self.theme);
        self.theme
    }

    pub fn switch_label(&self) -> String {
        format!("Switch to {} mode", self.theme.toggled())
    }

    pub fn icon(&self) -> Span<'static> {
        self.icon.render(self.theme)
    }

    /// The footer entry advertising the toggle.
    pub fn action_button(&self) -> ActionButton {
        ActionButton::new(THEME_TOGGLE_KEY, self.icon().content.into_owned())
    }
}
