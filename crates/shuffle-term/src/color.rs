// SPDX-License-Identifier: MIT
//
// Cell colors — what the terminal actually understands.
//
// The shuffle effects only ever need flat colors: a handful of hex grays
// for the scramble flicker, an accent, a dark settle color, and whatever
// the user configured as the text color. So this module carries the
// compact terminal-side representation only:
//
//   Default  → SGR 39/49, inherits the user's terminal theme
//   Ansi256  → palette index (38;5;N / 48;5;N)
//   Rgb      → 24-bit TrueColor (38;2;R;G;B / 48;2;R;G;B)
//
// Parsing accepts the forms a config file or a palette table would use:
// `#rgb`, `#rrggbb` (the `#` is optional), a bare palette index `0..=255`,
// and the word `default`. Surrounding whitespace is ignored — palette
// tables copied out of stylesheets tend to carry stray tabs.

use std::fmt;
use std::str::FromStr;

// ─── CellColor ───────────────────────────────────────────────────────────────

/// Compact color for terminal cell storage.
///
/// Small and cheap to compare, which matters in the renderer's hot
/// loop: every cell of every frame compares its `fg` and `bg`.
///
/// ```
/// use shuffle_term::color::CellColor;
///
/// let accent: CellColor = "#c96946".parse().unwrap();
/// assert_eq!(accent, CellColor::Rgb(0xc9, 0x69, 0x46));
/// assert_eq!(CellColor::hex("fff"), Some(CellColor::Rgb(255, 255, 255)));
/// assert_eq!("default".parse::<CellColor>(), Ok(CellColor::Default));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// 24-bit `TrueColor` (the standard for modern terminals).
    Rgb(u8, u8, u8),

    /// ANSI 256-color palette index.
    Ansi256(u8),

    /// Terminal default color (inherits from terminal settings).
    #[default]
    Default,
}

impl CellColor {
    /// Pure black, `#000000`.
    pub const BLACK: Self = Self::Rgb(0, 0, 0);

    /// Parse a hex color (`#rgb` or `#rrggbb`, `#` optional).
    ///
    /// Leading and trailing whitespace is ignored. Returns `None` for
    /// anything else.
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        let bytes = s.as_bytes();

        match bytes.len() {
            3 => {
                let r = parse_hex_digit(bytes[0])?;
                let g = parse_hex_digit(bytes[1])?;
                let b = parse_hex_digit(bytes[2])?;
                Some(Self::Rgb(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => {
                let r = parse_hex_byte(&bytes[0..2])?;
                let g = parse_hex_byte(&bytes[2..4])?;
                let b = parse_hex_byte(&bytes[4..6])?;
                Some(Self::Rgb(r, g, b))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Self::Ansi256(idx) => write!(f, "ansi({idx})"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ansi256(idx) => write!(f, "{idx}"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// A color string that is neither hex, a palette index, nor `default`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #rgb, #rrggbb, 0-255 or \"default\"")]
pub struct ParseColorError(pub String);

impl FromStr for CellColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }
        if !trimmed.starts_with('#') {
            if let Ok(idx) = trimmed.parse::<u8>() {
                return Ok(Self::Ansi256(idx));
            }
        }
        Self::hex(trimmed).ok_or_else(|| ParseColorError(s.to_owned()))
    }
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
