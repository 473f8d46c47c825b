// SPDX-License-Identifier: MIT
//
// Renderer — frame in, terminal bytes out.
//
// The terminal already shows the last frame we sent, so only columns that
// differ from it are written. While a shuffle runs that is the handful of
// glyphs the timeline touched since the last tick plus the status bar
// counter; a settled stage produces no cell output at all.
//
// A `Pen` remembers where the terminal cursor is and which colors and
// attributes are active, so runs of changed cells on one row cost one
// cursor move and one SGR sequence. Each frame is wrapped in synchronized
// output and sent in a single write.

use crate::ansi;
use crate::buffer::{FrameBuffer, char_width};
use crate::cell::{Attr, Cell};
use crate::color::CellColor;

/// Terminal state as the bytes written so far in this frame leave it.
#[derive(Debug, Default)]
struct Pen {
    /// Where the next printed character lands.
    cursor: Option<(u16, u16)>,
    fg: Option<CellColor>,
    bg: Option<CellColor>,
    attrs: Attr,
}

impl Pen {
    /// Write `cell` at `(x, y)`. Returns `false` when nothing was needed.
    fn draw(&mut self, out: &mut Vec<u8>, x: u16, y: u16, cell: Cell) -> bool {
        // The wide glyph to the left already covered this column.
        if cell.is_continuation() && self.cursor == Some((x.saturating_add(1), y)) {
            return false;
        }

        if self.cursor != Some((x, y)) {
            ansi::cursor_to(out, x, y).ok();
        }

        if cell.attrs != self.attrs {
            if !self.attrs.is_empty() {
                ansi::reset(out).ok();
                self.fg = None;
                self.bg = None;
            }
            ansi::attrs(out, cell.attrs).ok();
            self.attrs = cell.attrs;
        }
        if self.fg != Some(cell.fg) {
            ansi::fg(out, cell.fg).ok();
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            ansi::bg(out, cell.bg).ok();
            self.bg = Some(cell.bg);
        }

        let ch = cell.printable();
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());

        let advance: u16 = if char_width(ch) == 2 { 2 } else { 1 };
        self.cursor = Some((x.saturating_add(advance), y));
        true
    }
}

// ─── Renderer ───────────────────────────────────────────────────────────────

/// Turns successive frames into the minimal terminal output.
///
/// ```
/// use shuffle_term::buffer::FrameBuffer;
/// use shuffle_term::render::Renderer;
///
/// let mut renderer = Renderer::new();
/// let frame = FrameBuffer::new(4, 1);
/// assert!(!renderer.render(&frame).is_empty());
/// assert_eq!(renderer.cells_drawn(), 4);
/// renderer.render(&frame);
/// assert_eq!(renderer.cells_drawn(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Renderer {
    out: Vec<u8>,
    /// What the terminal currently displays.
    shown: Option<FrameBuffer>,
    drawn: usize,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `frame` against what the terminal shows and return the
    /// bytes to write. A size change (or [`invalidate`](Self::invalidate))
    /// clears the screen and redraws every column.
    pub fn render(&mut self, frame: &FrameBuffer) -> &[u8] {
        self.out.clear();
        self.drawn = 0;

        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            self.remember(frame);
            return &self.out;
        }

        let shown = self
            .shown
            .take()
            .filter(|s| s.width() == width && s.height() == height);

        ansi::begin_sync(&mut self.out).ok();
        if shown.is_none() {
            ansi::clear_screen(&mut self.out).ok();
        }

        let mut pen = Pen::default();
        for y in 0..height {
            let Some(row) = frame.row(y) else { continue };
            let old = shown.as_ref().and_then(|s| s.row(y));
            if old == Some(row) {
                continue;
            }
            for (x, &cell) in (0..width).zip(row) {
                if old.is_some_and(|old| old[usize::from(x)] == cell) {
                    continue;
                }
                if pen.draw(&mut self.out, x, y, cell) {
                    self.drawn += 1;
                }
            }
        }

        ansi::reset(&mut self.out).ok();
        ansi::end_sync(&mut self.out).ok();

        self.shown = shown;
        self.remember(frame);
        &self.out
    }

    /// Columns written by the last [`render`](Self::render).
    #[must_use]
    pub const fn cells_drawn(&self) -> usize {
        self.drawn
    }

    /// Forget what the terminal shows; the next frame is drawn in full.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    fn remember(&mut self, frame: &FrameBuffer) {
        match &mut self.shown {
            Some(s) if s.width() == frame.width() && s.height() == frame.height() => {
                s.copy_from(frame);
            }
            _ => self.shown = Some(frame.clone()),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(ch: char) -> Cell {
        Cell::styled(ch, CellColor::Default, CellColor::Default, Attr::empty())
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// A renderer that has already put `frame` on screen.
    fn settled(frame: &FrameBuffer) -> Renderer {
        let mut r = Renderer::new();
        r.render(frame);
        r
    }

    #[test]
    fn first_frame_clears_and_draws_everything() {
        let mut r = Renderer::new();
        let out = text(r.render(&FrameBuffer::new(5, 2)));
        assert!(out.starts_with("\x1b[?2026h\x1b[2J"));
        assert!(out.ends_with("\x1b[0m\x1b[?2026l"));
        assert_eq!(r.cells_drawn(), 10);
    }

    #[test]
    fn empty_frame_writes_nothing() {
        let mut r = Renderer::new();
        assert!(r.render(&FrameBuffer::new(0, 3)).is_empty());
        assert_eq!(r.cells_drawn(), 0);
    }

    #[test]
    fn unchanged_frame_draws_no_cells() {
        let frame = FrameBuffer::new(6, 3);
        let mut r = settled(&frame);
        let out = text(r.render(&frame));
        assert_eq!(r.cells_drawn(), 0);
        assert_eq!(out, "\x1b[?2026h\x1b[0m\x1b[?2026l");
    }

    #[test]
    fn one_scrambled_glyph_is_one_cell() {
        let mut frame = FrameBuffer::new(8, 3);
        let mut r = settled(&frame);
        frame.set(3, 2, cell('▒'));
        let out = text(r.render(&frame));
        assert_eq!(r.cells_drawn(), 1);
        assert!(out.contains("\x1b[3;4H"));
        assert!(out.contains('▒'));
    }

    #[test]
    fn adjacent_changes_share_one_cursor_move() {
        let mut frame = FrameBuffer::new(8, 1);
        let mut r = settled(&frame);
        frame.set(2, 0, cell('a'));
        frame.set(3, 0, cell('b'));
        let out = text(r.render(&frame));
        assert_eq!(out.matches('H').count(), 1);
        assert!(out.contains("ab"));
    }

    #[test]
    fn color_change_alone_redraws_the_cell() {
        let mut frame = FrameBuffer::new(2, 1);
        frame.set(0, 0, cell('a'));
        let mut r = settled(&frame);
        frame.get_mut(0, 0).unwrap().fg = CellColor::Rgb(0xc9, 0x69, 0x46);
        let out = text(r.render(&frame));
        assert_eq!(r.cells_drawn(), 1);
        assert!(out.contains("\x1b[38;2;201;105;70m"));
        assert!(out.contains('a'));
    }

    #[test]
    fn dropping_inverse_resets_colors() {
        let mut frame = FrameBuffer::new(2, 1);
        let mut r = settled(&frame);
        frame.set(0, 0, cell('a').with_attrs(Attr::INVERSE));
        frame.set(1, 0, cell('b'));
        let out = text(r.render(&frame));
        assert!(out.contains("\x1b[7m\x1b[39m\x1b[49ma\x1b[0m\x1b[39m\x1b[49mb"));
    }

    #[test]
    fn tail_after_wide_glyph_is_silent() {
        let mut frame = FrameBuffer::new(4, 1);
        let mut r = settled(&frame);
        frame.paint_text(0, 0, "日", CellColor::Default, CellColor::Default, Attr::empty());
        let out = text(r.render(&frame));
        assert_eq!(r.cells_drawn(), 1);
        assert!(out.contains('日'));
        assert!(!out.contains("日 "));
    }

    #[test]
    fn control_glyphs_never_reach_the_terminal() {
        let mut frame = FrameBuffer::new(8, 1);
        let mut r = settled(&frame);
        for (x, ch) in (0..).zip(['\u{1b}', '[', '2', 'J']) {
            frame.set(x, 0, cell(ch));
        }
        let out = text(r.render(&frame));
        assert!(!out.contains("\x1b[2J"));
        assert!(out.contains("\u{FFFD}[2J"));
    }

    #[test]
    fn resize_and_invalidate_redraw_in_full() {
        let mut r = settled(&FrameBuffer::new(4, 2));
        r.render(&FrameBuffer::new(6, 2));
        assert_eq!(r.cells_drawn(), 12);

        r.invalidate();
        let out = text(r.render(&FrameBuffer::new(6, 2)));
        assert_eq!(r.cells_drawn(), 12);
        assert!(out.contains("\x1b[2J"));
    }
}
