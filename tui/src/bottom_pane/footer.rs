//! The bottom-pane footer renders key hints under the composer.
//!
//! The footer is pure rendering: it formats `FooterProps` into a `Line` without mutating any
//! state. Whether sending is currently possible is decided by `ChatComposer` and passed in; the
//! footer only dims the send hint accordingly.
use crate::bottom_pane::ActionButton;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::ui_consts::FOOTER_INDENT_COLS;
use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;

const HINT_SEPARATOR: &str = "   ";

/// The rendering inputs for the footer area under the composer.
#[derive(Clone, Copy, Debug)]
pub struct FooterProps {
    pub mode: FooterMode,
    /// Result of the submission gate at render time.
    pub can_send: bool,
    pub disabled: bool,
    pub data_grounding: bool,
    pub quit_shortcut_key: KeyBinding,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FooterMode {
    /// Transient "press again to quit" reminder.
    QuitShortcutReminder,
    ShortcutSummary,
}

pub fn footer_height(_props: FooterProps) -> u16 {
    1
}

pub fn render_footer(area: Rect, buf: &mut Buffer, props: FooterProps, buttons: &[ActionButton]) {
    let mut line = footer_line(props, buttons);
    line.spans
        .insert(0, Span::from(" ".repeat(FOOTER_INDENT_COLS)));
    Paragraph::new(line).render(area, buf);
}

fn footer_line(props: FooterProps, buttons: &[ActionButton]) -> Line<'static> {
    match props.mode {
        FooterMode::QuitShortcutReminder => {
            Line::from(vec![props.quit_shortcut_key.into(), " again to quit".into()]).dim()
        }
        FooterMode::ShortcutSummary => shortcut_summary_line(props, buttons),
    }
}

fn shortcut_summary_line(props: FooterProps, buttons: &[ActionButton]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    if props.disabled {
        spans.push("input disabled".dim().italic());
    } else {
        let send_key: Span<'static> = key_hint::plain(KeyCode::Enter).into();
        if props.can_send {
            spans.push(send_key.not_dim().bold());
            spans.push(" send".into());
        } else {
            spans.push(send_key);
            spans.push(" send".dim());
        }
        spans.push(HINT_SEPARATOR.into());
        spans.push(key_hint::shift(KeyCode::Enter).into());
        spans.push(" newline".dim());
    }

    for button in buttons {
        spans.push(HINT_SEPARATOR.into());
        spans.extend(button.spans());
    }

    if props.data_grounding {
        spans.push(HINT_SEPARATOR.into());
        spans.push("on your data".cyan().dim());
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::Modifier;

    fn props() -> FooterProps {
        FooterProps {
            mode: FooterMode::ShortcutSummary,
            can_send: false,
            disabled: false,
            data_grounding: false,
            quit_shortcut_key: key_hint::ctrl(KeyCode::Char('c')),
        }
    }

    fn render_row(props: FooterProps, buttons: &[ActionButton]) -> (Buffer, String) {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        render_footer(area, &mut buf, props, buttons);
        let row: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        (buf, row.trim_end().to_string())
    }

    #[test]
    fn summary_lists_send_newline_and_buttons() {
        let buttons = [ActionButton::history(
            key_hint::ctrl(KeyCode::Char('h')),
            "History",
        )];
        let (_, row) = render_row(
            FooterProps {
                data_grounding: true,
                ..props()
            },
            &buttons,
        );
        assert_eq!(
            row,
            "  ⏎ send   shift + ⏎ newline   ctrl + h History   on your data"
        );
    }

    #[test]
    fn send_hint_is_dim_until_gate_opens() {
        let (buf, _) = render_row(props(), &[]);
        assert!(buf[(2, 0)].modifier.contains(Modifier::DIM));

        let (buf, _) = render_row(
            FooterProps {
                can_send: true,
                ..props()
            },
            &[],
        );
        assert!(!buf[(2, 0)].modifier.contains(Modifier::DIM));
        assert!(buf[(2, 0)].modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn disabled_footer_hides_send_hints() {
        let (_, row) = render_row(
            FooterProps {
                disabled: true,
                ..props()
            },
            &[],
        );
        assert_eq!(row, "  input disabled");
    }

    #[test]
    fn quit_reminder_replaces_hints() {
        let (_, row) = render_row(
            FooterProps {
                mode: FooterMode::QuitShortcutReminder,
                ..props()
            },
            &[],
        );
        assert_eq!(row, "  ctrl + c again to quit");
    }
}
