// SPDX-License-Identifier: MIT
//
// Console — the terminal as the event loop sees it.
//
// The loop needs five things from a terminal: take it over, give it back,
// report its size (and whether that changed), wait a bounded time for key
// bytes, and accept a rendered frame. `Console` is exactly that, so the
// loop can run against a scripted console in tests.
//
// `Tty` is the real one. Taking over means raw mode on stdin, the
// alternate screen, a hidden cursor. Input is polled directly on stdin
// with the tick interval as the timeout, so waiting for a key and waiting
// for the next animation tick are the same call. SIGWINCH only sets a
// flag; it also interrupts the poll, which ends that wait early.
//
// The terminal is handed back on `leave`, on drop, and from a panic hook
// that writes the restore sequence straight to fd 1 and resets termios
// from a saved copy.
#![allow(unsafe_code)]

use std::io::{self, Write};
use std::sync::Once;
use std::time::Duration;

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the size cannot be queried (pipes, tests).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Console ────────────────────────────────────────────────────────────────

/// Outcome of waiting for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Bytes were appended to the buffer.
    Input,
    /// The timeout passed (or a signal cut it short) with no input.
    Idle,
    /// Input is gone for good.
    Closed,
}

pub trait Console {
    /// Take the terminal over. Must be safe to call twice.
    ///
    /// # Errors
    ///
    /// Fails if the terminal cannot be switched into raw mode or written.
    fn enter(&mut self) -> io::Result<()>;

    /// Undo [`enter`](Console::enter). Must be safe to call when not entered.
    ///
    /// # Errors
    ///
    /// Fails if the restore sequence or the termios reset fails.
    fn leave(&mut self) -> io::Result<()>;

    fn size(&self) -> Size;

    /// The new size if the terminal was resized since the last call.
    fn take_resize(&mut self) -> Option<Size>;

    /// Wait up to `timeout` for input and append whatever arrives to `buf`.
    ///
    /// # Errors
    ///
    /// Fails on a read error other than an interrupted wait.
    fn wait_input(&mut self, timeout: Duration, buf: &mut Vec<u8>) -> io::Result<Wait>;

    /// Put one rendered frame on screen.
    ///
    /// # Errors
    ///
    /// Fails if the terminal cannot be written.
    fn present(&mut self, bytes: &[u8]) -> io::Result<()>;
}

// ─── Escape Sequences ───────────────────────────────────────────────────────

fn takeover_sequence() -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    ansi::enter_alt_screen(&mut out).ok();
    ansi::cursor_hide(&mut out).ok();
    ansi::clear_screen(&mut out).ok();
    out
}

/// Ends any half-sent frame first and leaves the alternate screen last,
/// so the shell comes back clean.
fn restore_sequence() -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    ansi::end_sync(&mut out).ok();
    ansi::reset(&mut out).ok();
    ansi::cursor_show(&mut out).ok();
    ansi::exit_alt_screen(&mut out).ok();
    out
}

// ─── Tty ────────────────────────────────────────────────────────────────────

/// The process's controlling terminal on stdin/stdout.
///
/// ```no_run
/// use shuffle_term::terminal::{Console, Tty};
///
/// let mut tty = Tty::new();
/// tty.enter()?;
/// // ... present frames ...
/// tty.leave()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Tty {
    saved: Option<sys::Termios>,
    size: Size,
    active: bool,
}

impl Tty {
    /// Query the size; the terminal is untouched until [`Console::enter`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            saved: None,
            size: sys::window_size().unwrap_or(Size::FALLBACK),
            active: false,
        }
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for Tty {
    fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_hooks();

        if sys::stdin_is_tty() {
            let original = sys::make_raw()?;
            sys::save_for_panic(Some(original));
            self.saved = Some(original);
        }
        self.active = true;
        self.present(&takeover_sequence())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let wrote = self.present(&restore_sequence());
        let restored = match self.saved.take() {
            Some(original) => {
                sys::save_for_panic(None);
                sys::restore(&original)
            }
            None => Ok(()),
        };
        wrote.and(restored)
    }

    fn size(&self) -> Size {
        self.size
    }

    fn take_resize(&mut self) -> Option<Size> {
        if !sys::take_sigwinch() {
            return None;
        }
        if let Some(size) = sys::window_size() {
            self.size = size;
        }
        Some(self.size)
    }

    fn wait_input(&mut self, timeout: Duration, buf: &mut Vec<u8>) -> io::Result<Wait> {
        if !sys::poll_stdin(timeout)? {
            return Ok(Wait::Idle);
        }
        let mut chunk = [0u8; 1024];
        match sys::read_stdin(&mut chunk)? {
            0 => Ok(Wait::Closed),
            n => {
                buf.extend_from_slice(&chunk[..n]);
                Ok(Wait::Input)
            }
        }
    }

    fn present(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Hooks ──────────────────────────────────────────────────────────────────

static HOOKS: Once = Once::new();

fn install_hooks() {
    HOOKS.call_once(|| {
        sys::watch_sigwinch();

        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            sys::write_stdout_raw(&restore_sequence());
            sys::restore_after_panic();
            previous(info);
        }));
    });
}

// ─── Platform ───────────────────────────────────────────────────────────────

#[cfg(unix)]
mod sys {
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::Size;

    pub type Termios = libc::termios;

    static SAVED: Mutex<Option<Termios>> = Mutex::new(None);
    static RESIZED: AtomicBool = AtomicBool::new(false);

    pub fn window_size() -> Option<Size> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let ok = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) } == 0;
        (ok && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    }

    pub fn stdin_is_tty() -> bool {
        unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
    }

    /// Switch stdin to raw mode and return the settings it had.
    pub fn make_raw() -> io::Result<Termios> {
        let mut original: Termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut raw_mode = original;
        unsafe { libc::cfmakeraw(&raw mut raw_mode) };
        restore(&raw_mode)?;
        Ok(original)
    }

    pub fn restore(termios: &Termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn save_for_panic(termios: Option<Termios>) {
        if let Ok(mut saved) = SAVED.lock() {
            *saved = termios;
        }
    }

    pub fn restore_after_panic() {
        if let Ok(saved) = SAVED.try_lock() {
            if let Some(termios) = saved.as_ref() {
                let _ = restore(termios);
            }
        }
    }

    /// `Ok(false)` on timeout or when a signal interrupted the wait.
    pub fn poll_stdin(timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        match unsafe { libc::poll(&raw mut pfd, 1, ms) } {
            n if n > 0 => Ok(true),
            0 => Ok(false),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    pub fn read_stdin(buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    /// Bypasses the stdout lock, which the panicking thread may hold.
    pub fn write_stdout_raw(bytes: &[u8]) {
        unsafe {
            let _ = libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
        }
    }

    extern "C" fn on_sigwinch(_: libc::c_int) {
        RESIZED.store(true, Ordering::Relaxed);
    }

    pub fn watch_sigwinch() {
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_sigwinch as *const () as usize;
            libc::sigemptyset(&raw mut action.sa_mask);
            // No SA_RESTART: the signal should end the input wait.
            libc::sigaction(libc::SIGWINCH, &raw const action, std::ptr::null_mut());
        }
    }

    pub fn take_sigwinch() -> bool {
        RESIZED.swap(false, Ordering::Relaxed)
    }
}

#[cfg(not(unix))]
mod sys {
    use std::io::{self, Write};
    use std::time::Duration;

    use super::Size;

    pub type Termios = ();

    pub const fn window_size() -> Option<Size> {
        None
    }

    pub const fn stdin_is_tty() -> bool {
        false
    }

    pub const fn make_raw() -> io::Result<Termios> {
        Ok(())
    }

    pub const fn restore(_: &Termios) -> io::Result<()> {
        Ok(())
    }

    pub const fn save_for_panic(_: Option<Termios>) {}

    pub const fn restore_after_panic() {}

    /// No non-blocking stdin here; the wait is just the tick.
    pub fn poll_stdin(timeout: Duration) -> io::Result<bool> {
        std::thread::sleep(timeout);
        Ok(false)
    }

    pub const fn read_stdin(_: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    pub fn write_stdout_raw(bytes: &[u8]) {
        let _ = io::stdout().write_all(bytes);
    }

    pub const fn watch_sigwinch() {}

    pub const fn take_sigwinch() -> bool {
        false
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
