// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key events. The shuffle front end never
// enables mouse, paste or keyboard-protocol extensions, so the parser
// only needs the legacy encodings every terminal speaks:
//
// - ASCII printable bytes and control characters (Ctrl+letter)
// - CSI and SS3 cursor keys, with xterm modifier parameters
// - Alt+key (ESC followed by a printable byte)
// - UTF-8 multi-byte characters
//
// Escape sequences can span several `read()` calls, so incomplete input
// stays buffered until the next [`Parser::advance`]. A lone ESC is
// ambiguous; after a quiet tick the event loop calls [`Parser::flush`]
// to turn it into an Escape key.

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(KeyEvent),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Whether this is Ctrl+`ch`.
    #[must_use]
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.code == KeyCode::Char(ch) && self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A Unicode character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

bitflags! {
    /// Keyboard modifiers, in xterm's `param = 1 + bitmask` order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Incremental terminal input parser.
///
/// ```
/// use shuffle_term::input::{Event, KeyCode, KeyEvent, Parser};
///
/// let mut parser = Parser::new();
/// let events = parser.advance(b"2");
/// assert_eq!(events, vec![Event::Key(KeyEvent::plain(KeyCode::Char('2')))]);
/// ```
pub struct Parser {
    buf: Vec<u8>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    /// Feed raw bytes and return every event that can be parsed.
    ///
    /// Incomplete sequences stay buffered for the next call.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match try_parse(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        events
    }

    /// Whether bytes are waiting for a sequence to complete.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Emit pending bytes as literal keys. A lone ESC becomes Escape.
    pub fn flush(&mut self) -> Vec<Event> {
        let events = self
            .buf
            .iter()
            .filter_map(|&byte| match byte {
                0x1B => Some(press(KeyCode::Escape)),
                b @ 0x01..=0x1A => Some(ctrl_key(ctrl_letter(b))),
                0x7F => Some(press(KeyCode::Backspace)),
                b @ 0x20..=0x7E => Some(press(KeyCode::Char(char::from(b)))),
                _ => None,
            })
            .collect();
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

enum Parsed {
    Event(Event, usize),
    Incomplete,
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    let Some(&first) = buf.first() else {
        return Parsed::Skip(0);
    };

    match first {
        0x1B => parse_escape(buf),
        0x08 | 0x7F => Parsed::Event(press(KeyCode::Backspace), 1),
        0x09 => Parsed::Event(press(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Event(press(KeyCode::Enter), 1),
        b @ 0x01..=0x1A => Parsed::Event(ctrl_key(ctrl_letter(b)), 1),
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(char::from(b))), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&second) = buf.get(1) else {
        return Parsed::Incomplete;
    };

    match second {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        b @ 0x20..=0x7E => Parsed::Event(
            key_with(KeyCode::Char(char::from(b)), Modifiers::ALT),
            2,
        ),
        _ => Parsed::Event(press(KeyCode::Escape), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    // Parameter and intermediate bytes run until a final byte in 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let consumed = end + 1;
    let modifiers = csi_modifiers(&buf[2..end]);
    let code = match buf[end] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'Z' => return Parsed::Event(key_with(KeyCode::Tab, Modifiers::SHIFT), consumed),
        _ => return Parsed::Skip(consumed),
    };
    Parsed::Event(key_with(code, modifiers), consumed)
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&code) = buf.get(2) else {
        return Parsed::Incomplete;
    };
    let code = match code {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        _ => return Parsed::Skip(3),
    };
    Parsed::Event(press(code), 3)
}

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);
    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            Parsed::Event(press(KeyCode::Char(ch)), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent::plain(code))
}

const fn ctrl_key(code: KeyCode) -> Event {
    key_with(code, Modifiers::CTRL)
}

const fn key_with(code: KeyCode, modifiers: Modifiers) -> Event {
    Event::Key(KeyEvent { code, modifiers })
}

/// 0x01 → 'a', 0x1A → 'z'.
const fn ctrl_letter(b: u8) -> KeyCode {
    KeyCode::Char((b + b'a' - 1) as char)
}

/// The modifier parameter of `CSI 1 ; <mod> X`, encoded as `1 + bitmask`.
#[allow(clippy::cast_possible_truncation)]
fn csi_modifiers(params: &[u8]) -> Modifiers {
    let Some(raw) = params.split(|&b| b == b';').nth(1) else {
        return Modifiers::empty();
    };
    let value = raw
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u16, |acc, &b| acc.saturating_mul(10).saturating_add(u16::from(b - b'0')));
    Modifiers::from_bits_truncate(value.saturating_sub(1) as u8)
}

const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
