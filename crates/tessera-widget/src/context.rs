//! Paint primitives. A [`RenderContext`] wraps a back buffer and a clip
//! rectangle; every primitive silently no-ops outside the clip instead of
//! panicking, so a widget that mis-measures never corrupts a sibling.

use tessera_cell::width::graphemes;
use tessera_cell::{Cell, CellAttrs, ScreenBuffer};
use tessera_color::Color;
use tessera_layout::Rect;

pub struct RenderContext<'a> {
    buffer: &'a mut ScreenBuffer,
    clip: Rect,
}

impl<'a> RenderContext<'a> {
    pub fn new(buffer: &'a mut ScreenBuffer, clip: Rect) -> Self {
        Self { buffer, clip }
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    fn in_clip(&self, x: u16, y: u16) -> bool {
        x >= self.clip.x
            && y >= self.clip.y
            && x < self.clip.x.saturating_add(self.clip.width)
            && y < self.clip.y.saturating_add(self.clip.height)
    }

    /// Draw `text` starting at `(x, y)`, truncating at the clip's right edge
    /// mid-grapheme-cluster rather than splitting one.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color, bg: Color, attrs: CellAttrs) {
        let mut cursor = x;
        for cluster in graphemes(text) {
            let cell = Cell::new(cluster, fg, bg, attrs);
            let width = cell.width as u16;
            if !self.in_clip(cursor, y) || !self.in_clip(cursor + width.saturating_sub(1), y) {
                break;
            }
            self.buffer.set(cursor, y, cell);
            cursor += width.max(1);
        }
    }

    /// A single-line-style rectangle outline using box-drawing characters.
    pub fn draw_box(&mut self, x: u16, y: u16, width: u16, height: u16, fg: Color, bg: Color) {
        if width == 0 || height == 0 {
            return;
        }
        let attrs = CellAttrs::empty();
        self.set_if_clipped(x, y, Cell::new("┌", fg, bg, attrs));
        self.set_if_clipped(x + width - 1, y, Cell::new("┐", fg, bg, attrs));
        self.set_if_clipped(x, y + height - 1, Cell::new("└", fg, bg, attrs));
        self.set_if_clipped(x + width - 1, y + height - 1, Cell::new("┘", fg, bg, attrs));
        for dx in 1..width.saturating_sub(1) {
            self.set_if_clipped(x + dx, y, Cell::new("─", fg, bg, attrs));
            self.set_if_clipped(x + dx, y + height - 1, Cell::new("─", fg, bg, attrs));
        }
        for dy in 1..height.saturating_sub(1) {
            self.set_if_clipped(x, y + dy, Cell::new("│", fg, bg, attrs));
            self.set_if_clipped(x + width - 1, y + dy, Cell::new("│", fg, bg, attrs));
        }
    }

    /// A horizontal rule, `width` cells long, starting at `(x, y)`.
    pub fn draw_separator(&mut self, x: u16, y: u16, width: u16, fg: Color, bg: Color) {
        for dx in 0..width {
            self.set_if_clipped(x + dx, y, Cell::new("─", fg, bg, CellAttrs::empty()));
        }
    }

    pub fn fill(&mut self, x: u16, y: u16, width: u16, height: u16, ch: &str, fg: Color, bg: Color) {
        for dy in 0..height {
            for dx in 0..width {
                self.set_if_clipped(x + dx, y + dy, Cell::new(ch, fg, bg, CellAttrs::empty()));
            }
        }
    }

    pub fn draw_checkbox(&mut self, x: u16, y: u16, checked: bool, fg: Color, bg: Color) {
        let glyph = if checked { "☑" } else { "☐" };
        self.set_if_clipped(x, y, Cell::new(glyph, fg, bg, CellAttrs::empty()));
    }

    pub fn draw_radio(&mut self, x: u16, y: u16, selected: bool, fg: Color, bg: Color) {
        let glyph = if selected { "◉" } else { "◯" };
        self.set_if_clipped(x, y, Cell::new(glyph, fg, bg, CellAttrs::empty()));
    }

    fn set_if_clipped(&mut self, x: u16, y: u16, cell: Cell) {
        if self.in_clip(x, y) {
            self.buffer.set(x, y, cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: u16, y: u16, w: u16, h: u16) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn draw_text_stops_at_clip_right_edge() {
        let mut buf = ScreenBuffer::new(5, 1);
        let mut ctx = RenderContext::new(&mut buf, rect(0, 0, 3, 1));
        ctx.draw_text(0, 0, "hello", Color::Default, Color::Default, CellAttrs::empty());
        assert_eq!(buf.get(0, 0).unwrap().ch, "h");
        assert_eq!(buf.get(3, 0).unwrap().ch, " ");
    }

    #[test]
    fn draw_text_outside_clip_is_a_no_op() {
        let mut buf = ScreenBuffer::new(5, 5);
        let mut ctx = RenderContext::new(&mut buf, rect(0, 0, 2, 2));
        ctx.draw_text(3, 3, "x", Color::Default, Color::Default, CellAttrs::empty());
        assert_eq!(buf.get(3, 3).unwrap().ch, " ");
    }

    #[test]
    fn draw_box_paints_all_four_corners() {
        let mut buf = ScreenBuffer::new(5, 5);
        let mut ctx = RenderContext::new(&mut buf, rect(0, 0, 5, 5));
        ctx.draw_box(0, 0, 4, 3, Color::Default, Color::Default);
        assert_eq!(buf.get(0, 0).unwrap().ch, "┌");
        assert_eq!(buf.get(3, 0).unwrap().ch, "┐");
        assert_eq!(buf.get(0, 2).unwrap().ch, "└");
        assert_eq!(buf.get(3, 2).unwrap().ch, "┘");
    }

    #[test]
    fn checkbox_glyph_reflects_checked_state() {
        let mut buf = ScreenBuffer::new(2, 1);
        let mut ctx = RenderContext::new(&mut buf, rect(0, 0, 2, 1));
        ctx.draw_checkbox(0, 0, true, Color::Default, Color::Default);
        assert_eq!(buf.get(0, 0).unwrap().ch, "☑");
    }

    #[test]
    fn fill_covers_the_requested_rectangle() {
        let mut buf = ScreenBuffer::new(4, 4);
        let mut ctx = RenderContext::new(&mut buf, rect(0, 0, 4, 4));
        ctx.fill(1, 1, 2, 2, "#", Color::Default, Color::Default);
        assert_eq!(buf.get(1, 1).unwrap().ch, "#");
        assert_eq!(buf.get(2, 2).unwrap().ch, "#");
        assert_eq!(buf.get(0, 0).unwrap().ch, " ");
    }
}
