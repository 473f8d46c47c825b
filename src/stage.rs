// SPDX-License-Identifier: MIT
//
// Stage — the terminal presentation surface.
//
// The engine forwards every content and color change to a Surface. The
// Stage keeps those changes in a persistent canvas (a FrameBuffer sized to
// the text) laid out from the segmenter's columns, so whitespace between
// words stays where it was in the source. Each frame the canvas is blitted
// centered into the screen with a one-line status bar underneath:
//
//   ┌──────────────────────────────┐
//   │                              │
//   │        canvas (centered)     │
//   │                              │
//   ├──────────────────────────────┤
//   │ status bar (INVERSE)         │  ← last row
//   └──────────────────────────────┘
//
// A blanked cell holds NBSP; it paints as an ordinary space. A control
// character paints as U+FFFD so nothing written to a cell can steer the
// terminal.

use shuffle_core::block::CellAddr;
use shuffle_core::palette::NBSP;
use shuffle_core::segment::Segmented;
use shuffle_core::surface::Surface;
use shuffle_term::buffer::{FrameBuffer, char_width};
use shuffle_term::cell::{Attr, Cell, REPLACEMENT};
use shuffle_term::color::CellColor;

/// Where one engine cell lives on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    x: u16,
    y: u16,
    width: u16,
}

pub struct Stage {
    canvas: FrameBuffer,
    slots: Vec<Vec<Slot>>,
}

impl Stage {
    /// A blank canvas with one slot per segmented unit.
    pub fn new(seg: &Segmented, background: CellColor) -> Self {
        let mut canvas = FrameBuffer::new(clamp(seg.width()), clamp(seg.height()));
        let blank = Cell::EMPTY.with_bg(background);
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                canvas.set(x, y, blank);
            }
        }

        let slots = seg
            .lines
            .iter()
            .map(|line| {
                line.units()
                    .map(|u| Slot {
                        x: clamp(u.column),
                        y: clamp(line.row),
                        width: clamp(u.width.min(2)),
                    })
                    .collect()
            })
            .collect();

        Self { canvas, slots }
    }

    fn slot(&self, addr: CellAddr) -> Option<Slot> {
        self.slots.get(addr.line)?.get(addr.cell).copied()
    }

    #[must_use]
    pub const fn canvas(&self) -> &FrameBuffer {
        &self.canvas
    }

    /// Canvas text of row `y`, trailing blanks trimmed.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.canvas.row_text(y).trim_end().to_owned()
    }

    /// Blit the canvas centered above a status bar on the last row.
    pub fn paint(&self, frame: &mut FrameBuffer, status: &str) {
        let w = frame.width();
        let h = frame.height();
        if h == 0 {
            return;
        }

        let area_h = h - 1;
        let x = w.saturating_sub(self.canvas.width()) / 2;
        let y = area_h.saturating_sub(self.canvas.height()) / 2;
        frame.blit(&self.canvas, x, y);

        // Rows of the canvas that spilled onto the status row are overdrawn.
        let bar = Cell::EMPTY.with_attrs(Attr::INVERSE);
        for bx in 0..w {
            frame.set(bx, area_h, bar);
        }
        frame.paint_text(
            1,
            area_h,
            status,
            CellColor::Default,
            CellColor::Default,
            Attr::INVERSE,
        );
    }
}

impl Surface for Stage {
    fn set_content(&mut self, addr: CellAddr, content: &str) {
        let Some(slot) = self.slot(addr) else {
            return;
        };
        let Some(current) = self.canvas.get(slot.x, slot.y).copied() else {
            return;
        };
        let (fg, bg, attrs) = (current.fg, current.bg, current.attrs);

        let ch = match content.chars().next() {
            _ if content == NBSP => ' ',
            Some(ch) if ch.is_control() => REPLACEMENT,
            Some(ch) => ch,
            None => ' ',
        };
        let glyph_width: u16 = if char_width(ch) == 2 { 2 } else { 1 };

        if glyph_width > slot.width {
            // A wide glyph in a narrow slot would shift the rest of the row.
            self.canvas.set(slot.x, slot.y, Cell::styled('?', fg, bg, attrs));
            return;
        }

        self.canvas.set(slot.x, slot.y, Cell::styled(ch, fg, bg, attrs));
        if slot.width == 2 {
            let second = if glyph_width == 2 {
                Cell::continuation(fg, bg, attrs)
            } else {
                Cell::styled(' ', fg, bg, attrs)
            };
            self.canvas.set(slot.x + 1, slot.y, second);
        }
    }

    fn set_color(&mut self, addr: CellAddr, color: CellColor) {
        let Some(slot) = self.slot(addr) else {
            return;
        };
        for dx in 0..slot.width {
            if let Some(cell) = self.canvas.get_mut(slot.x + dx, slot.y) {
                cell.fg = color;
            }
        }
    }
}

fn clamp(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shuffle_core::block::TextBlock;
    use shuffle_core::segment::segment;
    use shuffle_term::render::Renderer;

    fn staged(text: &str) -> (Stage, TextBlock) {
        let seg = segment(text);
        let block = TextBlock::from_segments(&seg, CellColor::Default, CellColor::Default);
        let mut stage = Stage::new(&seg, CellColor::Default);
        block.sync(&mut stage);
        (stage, block)
    }

    // ── Layout ────────────────────────────────────────────────────────────

    #[test]
    fn sync_reproduces_source_layout() {
        let (stage, _) = staged("hello  world\n\n\tend");
        assert_eq!(stage.row_text(0), "hello  world");
        assert_eq!(stage.row_text(1), "");
        assert_eq!(stage.row_text(2), "    end");
        assert_eq!(stage.canvas().height(), 3);
    }

    #[test]
    fn wide_characters_keep_their_columns() {
        let (stage, _) = staged("日本 ok");
        assert!(stage.canvas().get(1, 0).unwrap().is_continuation());
        assert_eq!(stage.row_text(0), "日本 ok");
    }

    // ── Surface ───────────────────────────────────────────────────────────

    #[test]
    fn nbsp_paints_as_space() {
        let (mut stage, _) = staged("ab");
        stage.set_content(CellAddr::new(0, 0), NBSP);
        assert_eq!(stage.row_text(0), " b");
    }

    #[test]
    fn content_and_color_land_in_slot() {
        let (mut stage, _) = staged("a b");
        let addr = CellAddr::new(0, 1);
        stage.set_content(addr, "▓");
        stage.set_color(addr, CellColor::BLACK);
        let cell = stage.canvas().get(2, 0).unwrap();
        assert_eq!(cell.character(), Some('▓'));
        assert_eq!(cell.fg, CellColor::BLACK);
    }

    #[test]
    fn narrow_glyph_in_wide_slot_pads_with_space() {
        let (mut stage, _) = staged("日");
        stage.set_content(CellAddr::new(0, 0), "░");
        assert_eq!(stage.canvas().get(1, 0).unwrap().character(), Some(' '));
        stage.set_content(CellAddr::new(0, 0), "日");
        assert!(stage.canvas().get(1, 0).unwrap().is_continuation());
    }

    #[test]
    fn control_content_paints_as_replacement() {
        let (mut stage, _) = staged("ab");
        stage.set_content(CellAddr::new(0, 1), "\u{1b}");
        assert_eq!(stage.canvas().get(1, 0).unwrap().character(), Some(REPLACEMENT));
    }

    #[test]
    fn escape_sequence_in_cells_never_reaches_the_terminal() {
        let (mut stage, _) = staged("okx[2J");
        stage.set_content(CellAddr::new(0, 2), "\u{1b}");

        let mut frame = FrameBuffer::new(20, 3);
        let mut renderer = Renderer::new();
        renderer.render(&frame);
        stage.paint(&mut frame, "fx1");
        let out = String::from_utf8(renderer.render(&frame).to_vec()).unwrap();

        assert!(!out.contains("\x1b[2J"));
        assert!(out.contains("ok\u{FFFD}[2J"));
    }

    #[test]
    fn unknown_addr_is_ignored() {
        let (mut stage, _) = staged("a");
        stage.set_content(CellAddr::new(3, 0), "x");
        stage.set_color(CellAddr::new(0, 9), CellColor::BLACK);
        assert_eq!(stage.row_text(0), "a");
    }

    // ── Paint ─────────────────────────────────────────────────────────────

    #[test]
    fn paint_centers_canvas_and_draws_status() {
        let (stage, _) = staged("hi");
        let mut frame = FrameBuffer::new(10, 5);
        stage.paint(&mut frame, "fx1");
        // Text area is rows 0..4; canvas 2x1 lands at (4, 1).
        assert_eq!(frame.row_text(1).trim_end(), "    hi");
        assert_eq!(frame.row_text(4).trim_end(), " fx1");
        assert!(frame.get(0, 4).unwrap().attrs.contains(Attr::INVERSE));
    }

    #[test]
    fn paint_into_tiny_frame_does_not_panic() {
        let (stage, _) = staged("a long line of text");
        let mut frame = FrameBuffer::new(3, 1);
        stage.paint(&mut frame, "status");
        let mut empty = FrameBuffer::new(0, 0);
        stage.paint(&mut empty, "status");
    }
}
