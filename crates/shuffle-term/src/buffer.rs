// SPDX-License-Identifier: MIT
//
// FrameBuffer — the 2D cell grid that everything paints to.
//
// The shuffle front end keeps two of these around: a persistent canvas
// the text stage writes glyphs into as the effect scheduler mutates
// cells, and the per-frame buffer the event loop clears, the app paints
// (canvas blit + status bar), and the renderer compares against what the
// terminal already shows.
//
// Flat `Vec<Cell>` with row-major indexing: a row's cells are contiguous,
// so the renderer's left-to-right scan is linear and an unchanged row is
// skipped with a single slice equality.

use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── FrameBuffer ─────────────────────────────────────────────────────────────

/// A `width × height` grid of [`Cell`]s.
///
/// ```
/// use shuffle_term::buffer::FrameBuffer;
/// use shuffle_term::cell::Attr;
/// use shuffle_term::color::CellColor;
///
/// let mut buf = FrameBuffer::new(10, 2);
/// buf.paint_text(1, 0, "hi", CellColor::Default, CellColor::Default, Attr::empty());
/// assert_eq!(buf.get(1, 0).and_then(|c| c.character()), Some('h'));
/// assert_eq!(buf.row_text(0).trim_end(), " hi");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a buffer filled with empty cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    /// Buffer width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Whether `(x, y)` lies inside the buffer.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Mutable access to the cell at `(x, y)`.
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// One row as a slice, or `None` when `y` is out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// The characters of one row as a `String` (continuations skipped).
    ///
    /// Mostly for tests and debugging.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|row| row.iter().filter_map(|c| c.character()).collect())
            .unwrap_or_default()
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Resize the buffer. Contents are discarded.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(usize::from(width) * usize::from(height), Cell::EMPTY);
    }

    /// Copy another buffer's cells into this one (same dimensions only).
    ///
    /// Reuses the allocation; the renderer calls this every frame.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.cells.copy_from_slice(&other.cells);
    }

    /// Write a fully resolved cell. Returns `false` when out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        true
    }

    // ─── Text Painting ──────────────────────────────────────────────────

    /// Paint a string left-to-right starting at `(x, y)`.
    ///
    /// Wide characters take two columns and get a continuation cell;
    /// zero-width characters are skipped. A wide character that would not
    /// fit at the right edge becomes a space. Returns the columns consumed.
    pub fn paint_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: CellColor,
        bg: CellColor,
        attrs: Attr,
    ) -> u16 {
        if y >= self.height {
            return 0;
        }

        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if w == 2 && col + 1 >= self.width {
                self.set(col, y, Cell::styled(' ', fg, bg, attrs));
                col += 1;
                break;
            }
            self.set(col, y, Cell::styled(ch, fg, bg, attrs));
            if w == 2 {
                self.set(col + 1, y, Cell::continuation(fg, bg, attrs));
            }
            #[allow(clippy::cast_possible_truncation)] // w is 1 or 2.
            let w = w as u16;
            col = col.saturating_add(w);
        }

        col.saturating_sub(x)
    }

    /// Copy `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// Cells that fall outside this buffer are dropped.
    pub fn blit(&mut self, src: &Self, x: u16, y: u16) {
        for sy in 0..src.height {
            let Some(dy) = y.checked_add(sy) else { break };
            if dy >= self.height {
                break;
            }
            for sx in 0..src.width {
                let Some(dx) = x.checked_add(sx) else { break };
                if dx >= self.width {
                    break;
                }
                let cell = src.cells[src.index(sx, sy)];
                let idx = self.index(dx, dy);
                self.cells[idx] = cell;
            }
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

// ─── Text Width Utilities ────────────────────────────────────────────────────

/// Display width of a character in terminal columns (0, 1 or 2).
///
/// Control characters count as zero.
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Glyph;
    use pretty_assertions::assert_eq;

    fn cell(ch: char) -> Cell {
        Cell::styled(ch, CellColor::Default, CellColor::Default, Attr::empty())
    }

    fn plain(buf: &mut FrameBuffer, x: u16, y: u16, s: &str) -> u16 {
        buf.paint_text(x, y, s, CellColor::Default, CellColor::Default, Attr::empty())
    }

    // ── Construction ────────────────────────────────────────────────────

    #[test]
    fn new_is_all_empty() {
        let buf = FrameBuffer::new(4, 3);
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.height(), 3);
        assert!((0..3).all(|y| buf.row(y).unwrap().iter().all(|c| *c == Cell::EMPTY)));
    }

    #[test]
    fn zero_sized_buffer() {
        let buf = FrameBuffer::new(0, 0);
        assert_eq!(buf.get(0, 0), None);
        assert_eq!(buf.row(0), None);
    }

    // ── Access ──────────────────────────────────────────────────────────

    #[test]
    fn set_and_get() {
        let mut buf = FrameBuffer::new(3, 3);
        assert!(buf.set(2, 1, cell('x')));
        assert_eq!(buf.get(2, 1), Some(&cell('x')));
    }

    #[test]
    fn set_out_of_bounds_is_rejected() {
        let mut buf = FrameBuffer::new(3, 3);
        assert!(!buf.set(3, 0, cell('x')));
        assert!(!buf.set(0, 3, cell('x')));
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut buf = FrameBuffer::new(2, 2);
        buf.get_mut(1, 1).unwrap().glyph = Glyph::Char('m');
        assert_eq!(buf.get(1, 1).unwrap().character(), Some('m'));
    }

    #[test]
    fn clear_resets_cells() {
        let mut buf = FrameBuffer::new(3, 1);
        plain(&mut buf, 0, 0, "abc");
        buf.clear();
        assert_eq!(buf.row_text(0), "   ");
    }

    #[test]
    fn resize_discards_contents() {
        let mut buf = FrameBuffer::new(3, 1);
        plain(&mut buf, 0, 0, "abc");
        buf.resize(5, 2);
        assert_eq!(buf.width(), 5);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.row_text(0), "     ");
    }

    #[test]
    fn copy_from_matches_source() {
        let mut a = FrameBuffer::new(3, 1);
        plain(&mut a, 0, 0, "xyz");
        let mut b = FrameBuffer::new(3, 1);
        b.copy_from(&a);
        assert_eq!(a, b);
    }

    // ── Text ────────────────────────────────────────────────────────────

    #[test]
    fn paint_text_returns_columns() {
        let mut buf = FrameBuffer::new(10, 1);
        assert_eq!(plain(&mut buf, 2, 0, "hey"), 3);
        assert_eq!(buf.row_text(0), "  hey     ");
    }

    #[test]
    fn paint_text_clips_at_right_edge() {
        let mut buf = FrameBuffer::new(4, 1);
        assert_eq!(plain(&mut buf, 2, 0, "hello"), 2);
        assert_eq!(buf.row_text(0), "  he");
    }

    #[test]
    fn paint_text_wide_char_gets_continuation() {
        let mut buf = FrameBuffer::new(4, 1);
        assert_eq!(plain(&mut buf, 0, 0, "中a"), 3);
        assert!(buf.get(1, 0).unwrap().is_continuation());
        assert_eq!(buf.get(2, 0).unwrap().character(), Some('a'));
    }

    #[test]
    fn paint_text_wide_char_at_edge_becomes_space() {
        let mut buf = FrameBuffer::new(3, 1);
        plain(&mut buf, 0, 0, "ab");
        assert_eq!(plain(&mut buf, 2, 0, "中"), 1);
        assert_eq!(buf.get(2, 0).unwrap().character(), Some(' '));
    }

    #[test]
    fn paint_text_off_screen_row_is_noop() {
        let mut buf = FrameBuffer::new(3, 1);
        assert_eq!(plain(&mut buf, 0, 5, "abc"), 0);
    }

    #[test]
    fn paint_text_applies_style() {
        let mut buf = FrameBuffer::new(2, 1);
        buf.paint_text(0, 0, "a", CellColor::BLACK, CellColor::Default, Attr::BOLD);
        let c = buf.get(0, 0).unwrap();
        assert_eq!(c.fg, CellColor::BLACK);
        assert_eq!(c.attrs, Attr::BOLD);
    }

    // ── Blit ────────────────────────────────────────────────────────────

    #[test]
    fn blit_places_source_at_offset() {
        let mut src = FrameBuffer::new(2, 2);
        plain(&mut src, 0, 0, "ab");
        plain(&mut src, 0, 1, "cd");
        let mut dst = FrameBuffer::new(5, 3);
        dst.blit(&src, 2, 1);
        assert_eq!(dst.row_text(0), "     ");
        assert_eq!(dst.row_text(1), "  ab ");
        assert_eq!(dst.row_text(2), "  cd ");
    }

    #[test]
    fn blit_clips_to_destination() {
        let mut src = FrameBuffer::new(3, 3);
        plain(&mut src, 0, 0, "abc");
        let mut dst = FrameBuffer::new(2, 1);
        dst.blit(&src, 1, 0);
        assert_eq!(dst.row_text(0), " a");
    }

    // ── Width helpers ───────────────────────────────────────────────────

    #[test]
    fn width_helpers() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('\u{301}'), 0);
        assert_eq!(char_width('\u{1b}'), 0);
    }
}
