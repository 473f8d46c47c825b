//! Presentation surface — where cell content and color end up.
//!
//! The engine never draws anything itself. Every content or color change a
//! [`TextBlock`](crate::block::TextBlock) makes is forwarded synchronously
//! to a [`Surface`], fire-and-forget.

use shuffle_term::color::CellColor;

use crate::block::CellAddr;

/// Receiver for display updates.
pub trait Surface {
    /// Show `content` at `addr`.
    fn set_content(&mut self, addr: CellAddr, content: &str);

    /// Change the display color at `addr`.
    fn set_color(&mut self, addr: CellAddr, color: CellColor);
}

/// One update received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceWrite {
    Content(CellAddr, String),
    Color(CellAddr, CellColor),
}

/// A surface that records every update in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub writes: Vec<SurfaceWrite>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content writes to `addr`, oldest first.
    #[must_use]
    pub fn contents_at(&self, addr: CellAddr) -> Vec<&str> {
        self.writes
            .iter()
            .filter_map(|w| match w {
                SurfaceWrite::Content(a, s) if *a == addr => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Color writes to `addr`, oldest first.
    #[must_use]
    pub fn colors_at(&self, addr: CellAddr) -> Vec<CellColor> {
        self.writes
            .iter()
            .filter_map(|w| match w {
                SurfaceWrite::Color(a, c) if *a == addr => Some(*c),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn set_content(&mut self, addr: CellAddr, content: &str) {
        self.writes.push(SurfaceWrite::Content(addr, content.to_owned()));
    }

    fn set_color(&mut self, addr: CellAddr, color: CellColor) {
        self.writes.push(SurfaceWrite::Color(addr, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_surface_keeps_order_per_cell() {
        let a = CellAddr::new(0, 0);
        let b = CellAddr::new(0, 1);
        let mut s = RecordingSurface::new();
        s.set_content(a, "x");
        s.set_content(b, "y");
        s.set_color(a, CellColor::BLACK);
        s.set_content(a, "z");

        assert_eq!(s.contents_at(a), vec!["x", "z"]);
        assert_eq!(s.contents_at(b), vec!["y"]);
        assert_eq!(s.colors_at(a), vec![CellColor::BLACK]);
        assert!(s.colors_at(b).is_empty());
    }
}
