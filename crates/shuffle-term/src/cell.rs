// SPDX-License-Identifier: MIT
//
// Cell — one screen column.
//
// The stage canvas and the per-frame buffer are grids of these. A glyph
// that is two columns wide (CJK, most emoji) owns its column and marks the
// column to its right as `Glyph::Tail`; the renderer writes nothing for a
// tail that directly follows its head.
//
// Whatever ends up in a cell is eventually written to the terminal, so
// `printable` is the only way the renderer reads a character back out:
// control characters never reach the output stream.

use crate::color::CellColor;

// ─── Attributes ─────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// SGR text attributes.
    ///
    /// ```
    /// use shuffle_term::cell::Attr;
    ///
    /// let bar = Attr::INVERSE | Attr::BOLD;
    /// assert!(bar.contains(Attr::INVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        const BOLD      = 1 << 0;
        const DIM       = 1 << 1;
        const ITALIC    = 1 << 2;
        const UNDERLINE = 1 << 3;
        const INVERSE   = 1 << 4;
    }
}

// ─── Glyph ──────────────────────────────────────────────────────────────────

/// What a column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Char(char),
    /// Right half of a wide glyph in the column to the left.
    Tail,
}

/// Shown instead of anything the terminal would interpret.
pub const REPLACEMENT: char = '\u{FFFD}';

// ─── Cell ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: Glyph,
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attr,
}

impl Cell {
    /// A space in the terminal's default colors.
    pub const EMPTY: Self = Self {
        glyph: Glyph::Char(' '),
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    #[must_use]
    pub const fn styled(ch: char, fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            glyph: Glyph::Char(ch),
            fg,
            bg,
            attrs,
        }
    }

    #[must_use]
    pub const fn continuation(fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            glyph: Glyph::Tail,
            fg,
            bg,
            attrs,
        }
    }

    #[must_use]
    pub const fn is_continuation(self) -> bool {
        matches!(self.glyph, Glyph::Tail)
    }

    /// The stored character; `None` for a tail.
    #[must_use]
    pub const fn character(self) -> Option<char> {
        match self.glyph {
            Glyph::Char(ch) => Some(ch),
            Glyph::Tail => None,
        }
    }

    /// The character to put on the wire. Tails print as a space, control
    /// characters as [`REPLACEMENT`].
    #[must_use]
    pub fn printable(self) -> char {
        match self.glyph {
            Glyph::Char(ch) if ch.is_control() => REPLACEMENT,
            Glyph::Char(ch) => ch,
            Glyph::Tail => ' ',
        }
    }

    #[must_use]
    pub const fn with_bg(self, bg: CellColor) -> Self {
        Self { bg, ..self }
    }

    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
