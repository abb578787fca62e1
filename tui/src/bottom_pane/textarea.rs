//! Multi-line text buffer behind the composer.
//!
//! The buffer stores the draft verbatim and keeps a byte cursor on a grapheme boundary. Layout
//! is a hard wrap on display width, recomputed from the text on every query so it can never go
//! stale relative to the draft. When the wrapped text is taller than the area it is drawn into,
//! the view scrolls to keep the cursor row visible.

use std::ops::Range;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidgetRef;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::key_hint::has_ctrl_or_alt;

#[derive(Debug, Default, Clone)]
pub struct TextArea {
    text: String,
    cursor_pos: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextAreaState {
    /// Index of the first wrapped row shown.
    pub scroll: u16,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor_pos
    }

    /// Replace the whole buffer. The cursor moves to the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor_pos = self.text.len();
    }

    pub fn set_cursor(&mut self, pos: usize) {
        let mut pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        self.cursor_pos = pos;
    }

    pub fn insert_str(&mut self, text: &str) {
        self.text.insert_str(self.cursor_pos, text);
        self.cursor_pos += text.len();
    }

    pub fn replace_range(&mut self, range: Range<usize>, text: &str) {
        let removed = range.len();
        let start = range.start;
        self.text.replace_range(range, text);
        if self.cursor_pos >= start + removed {
            self.cursor_pos = self.cursor_pos - removed + text.len();
        } else if self.cursor_pos > start {
            self.cursor_pos = start + text.len();
        }
    }

    pub fn input(&mut self, event: KeyEvent) {
        match event {
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                ..
            } if !has_ctrl_or_alt(modifiers) => {
                let mut utf8 = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut utf8));
            }
            KeyEvent {
                code: KeyCode::Char('u'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                let start = self.line_start(self.cursor_pos);
                self.replace_range(start..self.cursor_pos, "");
            }
            KeyEvent {
                code: KeyCode::Char('k'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                let end = self.line_end(self.cursor_pos);
                self.replace_range(self.cursor_pos..end, "");
            }
            KeyEvent {
                code: KeyCode::Char('a'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
            | KeyEvent {
                code: KeyCode::Home,
                ..
            } => self.cursor_pos = self.line_start(self.cursor_pos),
            KeyEvent {
                code: KeyCode::Char('e'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
            | KeyEvent {
                code: KeyCode::End, ..
            } => self.cursor_pos = self.line_end(self.cursor_pos),
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                let start = self.prev_boundary(self.cursor_pos);
                self.replace_range(start..self.cursor_pos, "");
            }
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => {
                let end = self.next_boundary(self.cursor_pos);
                self.replace_range(self.cursor_pos..end, "");
            }
            KeyEvent {
                code: KeyCode::Left,
                ..
            } => self.cursor_pos = self.prev_boundary(self.cursor_pos),
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => self.cursor_pos = self.next_boundary(self.cursor_pos),
            KeyEvent {
                code: KeyCode::Up, ..
            } => self.move_vertical(false),
            KeyEvent {
                code: KeyCode::Down,
                ..
            } => self.move_vertical(true),
            _ => {}
        }
    }

    /// Number of wrapped rows needed to show the whole buffer at `width`.
    pub fn desired_height(&self, width: u16) -> u16 {
        u16::try_from(self.wrapped_lines(width).len()).unwrap_or(u16::MAX)
    }

    pub fn cursor_pos_with_state(&self, area: Rect, state: TextAreaState) -> Option<(u16, u16)> {
        if area.is_empty() {
            return None;
        }
        let lines = self.wrapped_lines(area.width);
        let (row, col) = Self::cursor_row_col(&self.text, &lines, self.cursor_pos);
        let scroll = Self::effective_scroll(area.height, lines.len(), row, state.scroll);
        let y = area.y + u16::try_from(row - scroll).unwrap_or(u16::MAX);
        let x = area.x + u16::try_from(col).unwrap_or(u16::MAX).min(area.width - 1);
        Some((x, y))
    }

    /// Byte ranges of each wrapped row. Newlines are not part of any row.
    ///
    /// A cursor at the end of a row that fills the whole width gets an empty row of its own.
    fn wrapped_lines(&self, width: u16) -> Vec<Range<usize>> {
        let width = usize::from(width.max(1));
        let mut rows = Vec::new();
        let mut line_start = 0;
        for line in self.text.split('\n') {
            let line_end = line_start + line.len();
            let mut row_start = line_start;
            let mut row_width = 0;
            for (offset, grapheme) in line.grapheme_indices(true) {
                let grapheme_width = grapheme.width();
                if row_width > 0 && row_width + grapheme_width > width {
                    rows.push(row_start..line_start + offset);
                    row_start = line_start + offset;
                    row_width = 0;
                }
                row_width += grapheme_width;
            }
            rows.push(row_start..line_end);
            if row_width >= width && self.cursor_pos == line_end {
                rows.push(line_end..line_end);
            }
            line_start = line_end + 1;
        }
        rows
    }

    fn cursor_row_col(text: &str, rows: &[Range<usize>], cursor: usize) -> (usize, usize) {
        // A cursor sitting exactly on a soft-wrap point belongs to the following row.
        let row = rows
            .iter()
            .rposition(|range| range.start <= cursor)
            .unwrap_or(0);
        let start = rows.get(row).map_or(0, |range| range.start);
        (row, text[start..cursor].width())
    }

    fn effective_scroll(height: u16, total_rows: usize, cursor_row: usize, scroll: u16) -> usize {
        let height = usize::from(height.max(1));
        let mut scroll = usize::from(scroll).min(total_rows.saturating_sub(height));
        if cursor_row < scroll {
            scroll = cursor_row;
        } else if cursor_row >= scroll + height {
            scroll = cursor_row + 1 - height;
        }
        scroll
    }

    fn prev_boundary(&self, pos: usize) -> usize {
        self.text[..pos]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self, pos: usize) -> usize {
        self.text[pos..]
            .graphemes(true)
            .next()
            .map_or(self.text.len(), |g| pos + g.len())
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |idx| idx + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.text[pos..]
            .find('\n')
            .map_or(self.text.len(), |idx| pos + idx)
    }

    fn move_vertical(&mut self, down: bool) {
        let start = self.line_start(self.cursor_pos);
        let column = self.text[start..self.cursor_pos].width();
        let target_start = if down {
            let end = self.line_end(self.cursor_pos);
            if end == self.text.len() {
                self.cursor_pos = end;
                return;
            }
            end + 1
        } else {
            if start == 0 {
                self.cursor_pos = 0;
                return;
            }
            self.line_start(start - 1)
        };
        let target_end = self.line_end(target_start);

        let mut pos = target_start;
        let mut width = 0;
        for (offset, grapheme) in self.text[target_start..target_end].grapheme_indices(true) {
            let grapheme_width = grapheme.width();
            if width + grapheme_width > column {
                break;
            }
            width += grapheme_width;
            pos = target_start + offset + grapheme.len();
        }
        self.cursor_pos = pos;
    }
}

impl StatefulWidgetRef for &TextArea {
    type State = TextAreaState;

    fn render_ref(&self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.is_empty() {
            return;
        }
        let rows = self.wrapped_lines(area.width);
        let (cursor_row, _) = TextArea::cursor_row_col(&self.text, &rows, self.cursor_pos);
        let scroll = TextArea::effective_scroll(area.height, rows.len(), cursor_row, state.scroll);
        state.scroll = u16::try_from(scroll).unwrap_or(u16::MAX);

        for (y, range) in (area.y..area.bottom()).zip(rows.into_iter().skip(scroll)) {
            buf.set_stringn(
                area.x,
                y,
                &self.text[range],
                usize::from(area.width),
                Style::default(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(textarea: &mut TextArea, text: &str) {
        for ch in text.chars() {
            textarea.input(key(KeyCode::Char(ch)));
        }
    }

    fn rendered_rows(textarea: &TextArea, area: Rect, state: &mut TextAreaState) -> Vec<String> {
        let mut buf = Buffer::empty(area);
        StatefulWidgetRef::render_ref(&textarea, area, &mut buf, state);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut textarea = TextArea::new();
        type_str(&mut textarea, "helo");
        textarea.input(key(KeyCode::Left));
        textarea.input(key(KeyCode::Char('l')));
        assert_eq!(textarea.text(), "hello");
        assert_eq!(textarea.cursor(), 4);
    }

    #[test]
    fn ctrl_chars_are_not_inserted() {
        let mut textarea = TextArea::new();
        textarea.input(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert!(textarea.is_empty());
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut textarea = TextArea::new();
        textarea.set_text("ae\u{301}👍🏽");
        textarea.input(key(KeyCode::Backspace));
        assert_eq!(textarea.text(), "ae\u{301}");
        textarea.input(key(KeyCode::Backspace));
        assert_eq!(textarea.text(), "a");
    }

    #[test]
    fn delete_and_line_kills() {
        let mut textarea = TextArea::new();
        textarea.set_text("first\nsecond line");
        textarea.set_cursor(9);
        textarea.input(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL));
        assert_eq!(textarea.text(), "first\nsec");
        textarea.input(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(textarea.text(), "first\n");
        textarea.input(key(KeyCode::Home));
        textarea.input(key(KeyCode::Backspace));
        assert_eq!(textarea.text(), "first");
        textarea.set_cursor(0);
        textarea.input(key(KeyCode::Delete));
        assert_eq!(textarea.text(), "irst");
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut textarea = TextArea::new();
        textarea.set_text("abcdef\nxy\n123456");
        textarea.set_cursor(4);
        textarea.input(key(KeyCode::Down));
        assert_eq!(textarea.cursor(), 9, "clamped to end of the short line");
        textarea.input(key(KeyCode::Down));
        assert_eq!(textarea.cursor(), 12);
        textarea.input(key(KeyCode::Up));
        textarea.input(key(KeyCode::Up));
        assert_eq!(textarea.cursor(), 2);
        textarea.input(key(KeyCode::Up));
        assert_eq!(textarea.cursor(), 0);
    }

    #[test]
    fn desired_height_counts_wrapped_rows() {
        let mut textarea = TextArea::new();
        assert_eq!(textarea.desired_height(10), 1);
        textarea.set_text("0123456789abc");
        assert_eq!(textarea.desired_height(10), 2);
        textarea.set_text("a\n\nb");
        assert_eq!(textarea.desired_height(10), 3);
        textarea.set_text("你好你好你好");
        assert_eq!(textarea.desired_height(5), 3);
    }

    #[test]
    fn render_scrolls_to_keep_cursor_visible() {
        let mut textarea = TextArea::new();
        textarea.set_text("one\ntwo\nthree\nfour");
        let area = Rect::new(0, 0, 10, 2);
        let mut state = TextAreaState::default();

        assert_eq!(
            rendered_rows(&textarea, area, &mut state),
            vec!["three", "four"]
        );
        assert_eq!(state.scroll, 2);
        assert_eq!(textarea.cursor_pos_with_state(area, state), Some((4, 1)));

        textarea.set_cursor(0);
        assert_eq!(rendered_rows(&textarea, area, &mut state), vec!["one", "two"]);
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn cursor_after_full_row_gets_its_own_row() {
        let mut textarea = TextArea::new();
        textarea.set_text("abcd");
        let area = Rect::new(0, 0, 4, 3);
        assert_eq!(textarea.desired_height(4), 2);
        assert_eq!(
            textarea.cursor_pos_with_state(area, TextAreaState::default()),
            Some((0, 1))
        );
        assert_eq!(
            rendered_rows(&textarea, area, &mut TextAreaState::default()),
            vec!["abcd", "", ""]
        );

        textarea.set_cursor(2);
        assert_eq!(textarea.desired_height(4), 1);
        assert_eq!(
            textarea.cursor_pos_with_state(area, TextAreaState::default()),
            Some((2, 0))
        );
    }

    #[test]
    fn cursor_at_soft_wrap_moves_to_next_row() {
        let mut textarea = TextArea::new();
        textarea.set_text("abcdefgh");
        textarea.set_cursor(4);
        let area = Rect::new(0, 0, 4, 3);
        assert_eq!(
            textarea.cursor_pos_with_state(area, TextAreaState::default()),
            Some((0, 1))
        );
    }
}
