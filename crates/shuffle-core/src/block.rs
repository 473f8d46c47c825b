//! Text block — the addressable units the engine animates.
//!
//! A [`TextBlock`] owns [`Line`]s of [`Cell`]s, built once from segmented
//! text and never reshaped afterwards. Every cell remembers what it looked
//! like at construction (`original`, `original_color`) next to what it
//! shows right now (`state`, `color`).
//!
//! The block also owns the animation token: a flag that is held from the
//! moment an effect starts until its last cell settles, plus the
//! completion counter that decides when that is. Only one effect may hold
//! the token at a time.
//!
//! [`TextBlock::set`] and [`TextBlock::set_color`] are the only ways to
//! change what a cell shows, and both forward the change to a
//! [`Surface`] immediately.

use shuffle_term::color::CellColor;

use crate::segment::Segmented;
use crate::surface::Surface;

// ---------------------------------------------------------------------------
// CellAddr
// ---------------------------------------------------------------------------

/// Address of a cell: line index, then cell index within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddr {
    pub line: usize,
    pub cell: usize,
}

impl CellAddr {
    #[must_use]
    pub const fn new(line: usize, cell: usize) -> Self {
        Self { line, cell }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// What a cell showed right before a step changed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCache {
    pub state: String,
    pub color: CellColor,
}

/// The smallest animated unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    position: usize,
    previous_position: Option<usize>,
    original: String,
    state: String,
    color: CellColor,
    original_color: CellColor,
    background: CellColor,
    cache: Option<CellCache>,
}

impl Cell {
    /// A cell at rest showing `content`.
    #[must_use]
    pub fn new(position: usize, content: impl Into<String>, color: CellColor) -> Self {
        let original = content.into();
        Self {
            position,
            previous_position: position.checked_sub(1),
            state: original.clone(),
            original,
            color,
            original_color: color,
            background: CellColor::Default,
            cache: None,
        }
    }

    #[must_use]
    pub fn with_background(mut self, background: CellColor) -> Self {
        self.background = background;
        self
    }

    /// Index within the line.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Index of the preceding cell, `None` for the first one.
    #[must_use]
    pub const fn previous_position(&self) -> Option<usize> {
        self.previous_position
    }

    /// Content captured at construction.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Content currently displayed.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub const fn color(&self) -> CellColor {
        self.color
    }

    #[must_use]
    pub const fn original_color(&self) -> CellColor {
        self.original_color
    }

    /// Background captured at construction. No built-in effect animates it.
    #[must_use]
    pub const fn background(&self) -> CellColor {
        self.background
    }

    /// The `(state, color)` pair from before the most recent step.
    #[must_use]
    pub const fn cache(&self) -> Option<&CellCache> {
        self.cache.as_ref()
    }

    /// Content and color both match construction.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.state == self.original && self.color == self.original_color
    }
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// An ordered run of cells. Addressing and stagger only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    position: usize,
    cells: Vec<Cell>,
}

impl Line {
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TextBlock
// ---------------------------------------------------------------------------

/// Aggregate root: all lines, the cell count, and the animation token.
#[derive(Debug, Clone)]
pub struct TextBlock {
    lines: Vec<Line>,
    total_cells: usize,
    settled: usize,
    in_progress: bool,
}

impl TextBlock {
    /// Build from segmenter output. Every cell starts in `color` over
    /// `background`.
    #[must_use]
    pub fn from_segments(seg: &Segmented, color: CellColor, background: CellColor) -> Self {
        Self::from_cells(seg.lines.iter().map(|line| {
            line.units()
                .map(|u| Cell::new(u.position, u.text.clone(), color).with_background(background))
                .collect()
        }))
    }

    /// Build from plain lines of cell contents. Empty lines are skipped.
    ///
    /// ```
    /// use shuffle_core::block::TextBlock;
    /// use shuffle_term::color::CellColor;
    ///
    /// let block = TextBlock::from_lines([vec!["a", "b", "c"], vec!["d", "e", "f"]], CellColor::Default);
    /// assert_eq!(block.total_cells(), 6);
    /// ```
    #[must_use]
    pub fn from_lines<L, I, S>(lines: L, color: CellColor) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_cells(lines.into_iter().map(|line| {
            line.into_iter()
                .enumerate()
                .map(|(pos, content)| Cell::new(pos, content, color))
                .collect()
        }))
    }

    fn from_cells(lines: impl Iterator<Item = Vec<Cell>>) -> Self {
        let lines: Vec<Line> = lines
            .filter(|cells| !cells.is_empty())
            .enumerate()
            .map(|(position, cells)| Line { position, cells })
            .collect();
        let total_cells = lines.iter().map(Line::len).sum();
        Self {
            lines,
            total_cells,
            settled: 0,
            in_progress: false,
        }
    }

    /// An empty block.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_cells(std::iter::empty())
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.total_cells
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_cells == 0
    }

    /// Whether an effect currently holds the token.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.in_progress
    }

    /// Cells settled so far in the current (or last) run.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.settled
    }

    #[must_use]
    pub fn cell(&self, addr: CellAddr) -> Option<&Cell> {
        self.lines.get(addr.line)?.cells.get(addr.cell)
    }

    /// Every cell with its address, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = (CellAddr, &Cell)> {
        self.lines.iter().enumerate().flat_map(|(li, line)| {
            line.cells
                .iter()
                .enumerate()
                .map(move |(ci, cell)| (CellAddr::new(li, ci), cell))
        })
    }

    /// Whether every cell shows its original content and color.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.cells().all(|(_, c)| c.is_at_rest())
    }

    /// Whether every cell shows its original content, whatever its color.
    #[must_use]
    pub fn content_restored(&self) -> bool {
        self.cells().all(|(_, c)| c.state == c.original)
    }

    // -- Mutation -----------------------------------------------------------

    /// Show `value` in the cell at `addr` and forward it to `surface`.
    /// Unknown addresses are ignored.
    pub fn set<S: Surface + ?Sized>(&mut self, addr: CellAddr, value: &str, surface: &mut S) {
        if let Some(cell) = self.cell_mut(addr) {
            value.clone_into(&mut cell.state);
            surface.set_content(addr, value);
        }
    }

    /// Change the cell's display color and forward it to `surface`.
    pub fn set_color<S: Surface + ?Sized>(
        &mut self,
        addr: CellAddr,
        color: CellColor,
        surface: &mut S,
    ) {
        if let Some(cell) = self.cell_mut(addr) {
            cell.color = color;
            surface.set_color(addr, color);
        }
    }

    /// Push every cell's current content and color to `surface`.
    pub fn sync<S: Surface + ?Sized>(&self, surface: &mut S) {
        for (addr, cell) in self.cells() {
            surface.set_content(addr, &cell.state);
            surface.set_color(addr, cell.color);
        }
    }

    pub(crate) fn remember(&mut self, addr: CellAddr) {
        if let Some(cell) = self.cell_mut(addr) {
            cell.cache = Some(CellCache {
                state: cell.state.clone(),
                color: cell.color,
            });
        }
    }

    fn cell_mut(&mut self, addr: CellAddr) -> Option<&mut Cell> {
        self.lines.get_mut(addr.line)?.cells.get_mut(addr.cell)
    }

    // -- Token --------------------------------------------------------------

    /// Take the token and reset the completion counter. False if already
    /// held or if there is nothing to animate.
    pub(crate) fn acquire(&mut self) -> bool {
        if self.in_progress || self.total_cells == 0 {
            return false;
        }
        self.in_progress = true;
        self.settled = 0;
        true
    }

    /// Count one settled cell. Releases the token and returns true when
    /// it was the last one.
    pub(crate) fn record_settled(&mut self) -> bool {
        self.settled += 1;
        if self.settled >= self.total_cells {
            self.in_progress = false;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
