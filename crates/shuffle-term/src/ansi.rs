// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; the renderer's pen makes those. This
// module only knows the byte-level encoding of the terminal commands the
// shuffle front end needs: cursor moves, colors, attributes, synchronized
// output, and the alternate screen.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal.

use std::io::{self, Write};

use crate::cell::Attr;
use crate::color::CellColor;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` (CUP).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
///
/// Clears colors too; a stateful writer must forget what it last emitted.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground color.
///
/// Compact SGR codes for the 16 standard colors, `38;5;N` for the rest of
/// the palette, `38;2;R;G;B` for TrueColor.
pub fn fg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[39m"),
        CellColor::Ansi256(idx) if idx < 8 => write!(w, "\x1b[{}m", 30 + u16::from(idx)),
        CellColor::Ansi256(idx) if idx < 16 => write!(w, "\x1b[{}m", 82 + u16::from(idx)),
        CellColor::Ansi256(idx) => write!(w, "\x1b[38;5;{idx}m"),
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Set the background color. Same strategy as [`fg`] with BG codes.
pub fn bg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[49m"),
        CellColor::Ansi256(idx) if idx < 8 => write!(w, "\x1b[{}m", 40 + u16::from(idx)),
        CellColor::Ansi256(idx) if idx < 16 => write!(w, "\x1b[{}m", 92 + u16::from(idx)),
        CellColor::Ansi256(idx) => write!(w, "\x1b[48;5;{idx}m"),
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit SGR codes for text attributes as a single CSI sequence.
///
/// `\x1b[1;4m` for bold + underline. Writes nothing when `attr` is empty.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    const CODES: [(Attr, &[u8]); 5] = [
        (Attr::BOLD, b"1"),
        (Attr::DIM, b"2"),
        (Attr::ITALIC, b"3"),
        (Attr::UNDERLINE, b"4"),
        (Attr::INVERSE, b"7"),
    ];

    if attr.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in CODES {
        if attr.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            w.write_all(code)?;
            first = false;
        }
    }
    w.write_all(b"m")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC 2026): the terminal buffers until
/// [`end_sync`], so a half-written frame never flickers on screen.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ────────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
