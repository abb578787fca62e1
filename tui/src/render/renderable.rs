use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// A piece of UI that knows how tall it wants to be at a given width.
pub trait Renderable {
    fn render(&self, area: Rect, buf: &mut Buffer);
    fn desired_height(&self, width: u16) -> u16;
    fn cursor_pos(&self, _area: Rect) -> Option<(u16, u16)> {
        None
    }
}
