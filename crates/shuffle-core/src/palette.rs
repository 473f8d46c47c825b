//! Glyph palettes and the colors the built-in effects use.
//!
//! A [`Palette`] is an immutable, non-empty list of substitute glyphs. Every
//! effect profile owns its own palette, so switching effects never changes
//! what another effect draws from.

use rand::Rng;
use shuffle_term::color::CellColor;
use unicode_segmentation::UnicodeSegmentation;

use crate::effect::ProfileError;

/// Non-breaking space: what blank-first effects write into every cell.
pub const NBSP: &str = "\u{a0}";

/// Uppercase letters, symbols and digits.
pub const ALPHANUMERIC: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ!@#$&*()-_+=/[]{};:<>,0123456789";

/// Light, medium and dark shade.
pub const BLOCKS: &str = "░▒▓";

/// Scramble grays for `fx1`, light to dark.
pub const FX1_GRAYS: [CellColor; 3] = [
    CellColor::Rgb(0xd9, 0xdd, 0xdc),
    CellColor::Rgb(0x80, 0x85, 0x88),
    CellColor::Rgb(0x36, 0x36, 0x36),
];

/// Scramble color for `reader`.
pub const READER_ACCENT: CellColor = CellColor::Rgb(0xc9, 0x69, 0x46);

/// Settle color for `clear-reader`.
pub const CLEAR_READER_DARK: CellColor = CellColor::BLACK;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// A non-empty set of substitute glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    glyphs: Vec<String>,
}

impl Palette {
    /// Build from explicit glyphs.
    ///
    /// # Errors
    ///
    /// [`ProfileError::EmptyPalette`] if `glyphs` is empty,
    /// [`ProfileError::ControlGlyph`] if one of them holds a control
    /// character.
    pub fn new<I, S>(glyphs: I) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let glyphs: Vec<String> = glyphs.into_iter().map(Into::into).collect();
        if glyphs.is_empty() {
            return Err(ProfileError::EmptyPalette);
        }
        if let Some(bad) = glyphs.iter().find(|g| g.chars().any(char::is_control)) {
            return Err(ProfileError::ControlGlyph(bad.clone()));
        }
        Ok(Self { glyphs })
    }

    /// One glyph per grapheme cluster of `s`, whitespace skipped.
    ///
    /// # Errors
    ///
    /// [`ProfileError::EmptyPalette`] if `s` has no visible graphemes.
    pub fn from_graphemes(s: &str) -> Result<Self, ProfileError> {
        Self::new(
            s.graphemes(true)
                .filter(|g| !g.chars().all(char::is_whitespace)),
        )
    }

    /// [`ALPHANUMERIC`] as a palette.
    #[must_use]
    pub fn alphanumeric() -> Self {
        Self::from_static(ALPHANUMERIC)
    }

    /// [`BLOCKS`] as a palette.
    #[must_use]
    pub fn blocks() -> Self {
        Self::from_static(BLOCKS)
    }

    fn from_static(s: &str) -> Self {
        Self {
            glyphs: s.chars().map(String::from).collect(),
        }
    }

    #[must_use]
    pub fn glyphs(&self) -> &[String] {
        &self.glyphs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Never true; palettes are validated on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// A uniformly random glyph.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.glyphs[rng.random_range(0..self.glyphs.len())]
    }

    /// Whether `glyph` belongs to this palette.
    #[must_use]
    pub fn contains(&self, glyph: &str) -> bool {
        self.glyphs.iter().any(|g| g == glyph)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
