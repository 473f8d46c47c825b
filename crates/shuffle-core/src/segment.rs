//! Text segmenter — lines → words → grapheme units.
//!
//! Splits a body of text into the hierarchy the engine animates:
//!
//! - **Lines** split on `\n` (a trailing `\r` is dropped). Lines with no
//!   visible units are not modeled, but every kept line remembers the
//!   source `row` it came from so a surface can lay the text out as written.
//! - **Words** follow Unicode word boundaries (UAX #29). Whitespace runs
//!   separate words and never become units.
//! - **Units** are extended grapheme clusters, so `é` written as `e` +
//!   combining accent, or a flag emoji, shuffle as one character. Clusters
//!   holding a control character (an ESC starting an escape sequence, BEL,
//!   C1 controls) are dropped and take no columns.
//!
//! Unit positions are contiguous across the whole line, not per word. Each
//! unit also records its display column (tabs advance to the next multiple
//! of [`TAB_WIDTH`], wide characters take two columns).

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns per tab stop.
pub const TAB_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One addressable character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// The grapheme cluster.
    pub text: String,
    /// Zero-based index within the line, contiguous across words.
    pub position: usize,
    /// Position of the preceding unit in the line, `None` for the first.
    pub previous_position: Option<usize>,
    /// Display column of the first cell this unit occupies.
    pub column: usize,
    /// Display width in columns (at least 1).
    pub width: usize,
}

/// A run of units between word boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub units: Vec<Unit>,
}

/// A non-empty line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedLine {
    /// Zero-based index among kept lines.
    pub position: usize,
    /// Zero-based index of the source line this came from.
    pub row: usize,
    pub words: Vec<Word>,
}

impl SegmentedLine {
    /// All units of the line in reading order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.words.iter().flat_map(|w| w.units.iter())
    }

    /// Number of units in the line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.units.len()).sum()
    }

    /// Always false for segmenter output; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Columns spanned from column 0 to the end of the last unit.
    #[must_use]
    pub fn width(&self) -> usize {
        self.units().last().map_or(0, |u| u.column + u.width)
    }
}

/// Segmented text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub lines: Vec<SegmentedLine>,
}

impl Segmented {
    /// Total units across all lines.
    #[must_use]
    pub fn total_units(&self) -> usize {
        self.lines.iter().map(SegmentedLine::len).sum()
    }

    /// Whether there is nothing to animate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Widest line in columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.lines.iter().map(SegmentedLine::width).max().unwrap_or(0)
    }

    /// Rows from the first source line to the last kept one.
    #[must_use]
    pub fn height(&self) -> usize {
        self.lines.last().map_or(0, |l| l.row + 1)
    }
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Segment `text` into lines, words and grapheme units.
///
/// ```
/// use shuffle_core::segment::segment;
///
/// let seg = segment("ab c\n\nde f");
/// assert_eq!(seg.lines.len(), 2);
/// assert_eq!(seg.lines[1].row, 2);
/// assert_eq!(seg.total_units(), 6);
/// ```
#[must_use]
pub fn segment(text: &str) -> Segmented {
    let mut lines = Vec::new();

    for (row, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let words = segment_line(raw);
        if words.is_empty() {
            continue;
        }
        lines.push(SegmentedLine {
            position: lines.len(),
            row,
            words,
        });
    }

    Segmented { lines }
}

fn segment_line(line: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut column = 0;
    let mut position = 0;

    for piece in line.split_word_bounds() {
        if piece.chars().all(char::is_whitespace) {
            column = advance_blank(column, piece);
            continue;
        }

        let mut units = Vec::new();
        for grapheme in piece.graphemes(true) {
            if grapheme.chars().any(char::is_control) {
                continue;
            }
            let width = grapheme.width().max(1);
            units.push(Unit {
                text: grapheme.to_owned(),
                position,
                previous_position: position.checked_sub(1),
                column,
                width,
            });
            position += 1;
            column += width;
        }
        if !units.is_empty() {
            words.push(Word { units });
        }
    }

    words
}

/// Advance `column` past a whitespace run, expanding tabs.
fn advance_blank(column: usize, blank: &str) -> usize {
    blank.chars().fold(column, |col, ch| match ch {
        '\t' => (col / TAB_WIDTH + 1) * TAB_WIDTH,
        ch => col + ch.width().unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
