use ratatui::style::Color;
use ratatui::style::Style;

use crate::theme::Theme;

/// Background/foreground of the composer block.
pub fn composer_style(theme: Theme) -> Style {
    match theme {
        Theme::Light => Style::default().bg(Color::Rgb(240, 240, 240)).fg(Color::Black),
        Theme::Dark => Style::default().bg(Color::Rgb(40, 40, 44)).fg(Color::White),
    }
}

/// Style of sent messages echoed in the transcript.
pub fn transcript_style(theme: Theme) -> Style {
    match theme {
        Theme::Light => Style::default().fg(Color::Black),
        Theme::Dark => Style::default().fg(Color::Gray),
    }
}

pub fn attachment_style(theme: Theme) -> Style {
    match theme {
        Theme::Light => Style::default().fg(Color::Blue),
        Theme::Dark => Style::default().fg(Color::Cyan),
    }
}
