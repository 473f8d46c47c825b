// SPDX-License-Identifier: MIT
//
// Event loop — keys and ticks in, frames out.
//
// Every iteration waits on the console for at most one tick interval
// (8.3ms by default). Whatever arrives in that window is parsed into key
// events for the app, then the app ticks, which is where the shuffle
// timeline catches up to the clock. A frame is painted and rendered only
// when a key, a resize, or a tick changed something, so a settled screen
// costs one poll per tick and no output.
//
// An ESC byte that no further bytes followed within a tick is the Escape
// key; the parser holds it until the next idle wait.
//
// The console is given back on the way out whether the loop ended
// normally or with an error. When both the loop and the teardown fail,
// the loop's error is the one reported.

use std::io;
use std::time::Duration;

use crate::buffer::FrameBuffer;
use crate::input::{Event, Parser};
use crate::render::Renderer;
use crate::terminal::{Console, Size, Tty, Wait};

// ─── App ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// What the loop drives.
///
/// Per iteration: [`on_event`](App::on_event) for each key,
/// [`on_resize`](App::on_resize) after a resize, [`on_tick`](App::on_tick)
/// once, then [`paint`](App::paint) if anything asked for it.
pub trait App {
    fn on_event(&mut self, _event: &Event) -> Action {
        Action::Continue
    }

    fn on_resize(&mut self, _size: Size) {}

    /// Advance time. The flag asks for a repaint; the action can end the
    /// loop (a one-shot run that has settled).
    fn on_tick(&mut self) -> (bool, Action) {
        (false, Action::Continue)
    }

    /// Paint the whole frame into a cleared buffer.
    fn paint(&mut self, frame: &mut FrameBuffer);
}

// ─── Config ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Longest wait for input, in microseconds. This is also the tick
    /// period and the lone-ESC timeout.
    pub tick_interval_us: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: 8333,
        }
    }
}

// ─── EventLoop ──────────────────────────────────────────────────────────────

pub struct EventLoop<T = Tty> {
    console: T,
    parser: Parser,
    renderer: Renderer,
    config: LoopConfig,
    input: Vec<u8>,
}

impl EventLoop<Tty> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LoopConfig) -> Self {
        Self::with_console(Tty::new(), config)
    }
}

impl Default for EventLoop<Tty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Console> EventLoop<T> {
    pub fn with_console(console: T, config: LoopConfig) -> Self {
        Self {
            console,
            parser: Parser::new(),
            renderer: Renderer::new(),
            config,
            input: Vec::with_capacity(64),
        }
    }

    /// Take the console over and run until the app quits or input closes.
    ///
    /// # Errors
    ///
    /// Setup, rendering, input and teardown errors. A loop error wins
    /// over a teardown error.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.console.enter()?;
        let result = self.drive(app);
        let teardown = self.console.leave();
        result.and(teardown)
    }

    fn drive(&mut self, app: &mut impl App) -> io::Result<()> {
        let size = self.console.size();
        let mut frame = FrameBuffer::new(size.cols, size.rows);
        let timeout = Duration::from_micros(self.config.tick_interval_us);
        let mut dirty = true;

        loop {
            self.input.clear();
            let events = match self.console.wait_input(timeout, &mut self.input)? {
                Wait::Input => self.parser.advance(&self.input),
                Wait::Idle if self.parser.has_pending() => self.parser.flush(),
                Wait::Idle => Vec::new(),
                Wait::Closed => return Ok(()),
            };
            for event in &events {
                if app.on_event(event) == Action::Quit {
                    return Ok(());
                }
            }
            dirty |= !events.is_empty();

            if let Some(size) = self.console.take_resize() {
                frame.resize(size.cols, size.rows);
                self.renderer.invalidate();
                app.on_resize(size);
                dirty = true;
            }

            let (changed, action) = app.on_tick();
            if dirty || changed {
                frame.clear();
                app.paint(&mut frame);
                let bytes = self.renderer.render(&frame);
                self.console.present(bytes)?;
                dirty = false;
            }

            if action == Action::Quit {
                return Ok(());
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attr;
    use crate::color::CellColor;
    use crate::input::{KeyCode, KeyEvent};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    /// A console fed from a script of input chunks. An empty chunk is an
    /// idle wait; an exhausted script is closed input.
    #[derive(Default)]
    struct Scripted {
        script: VecDeque<Vec<u8>>,
        resize_at: Option<(usize, Size)>,
        waits: usize,
        frames: Vec<Vec<u8>>,
        entered: bool,
        left: bool,
        fail_present: bool,
        fail_leave: bool,
    }

    impl Scripted {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                script: chunks.iter().map(|c| c.to_vec()).collect(),
                ..Self::default()
            }
        }
    }

    impl Console for Scripted {
        fn enter(&mut self) -> io::Result<()> {
            self.entered = true;
            Ok(())
        }

        fn leave(&mut self) -> io::Result<()> {
            self.left = true;
            if self.fail_leave {
                return Err(io::Error::other("leave failed"));
            }
            Ok(())
        }

        fn size(&self) -> Size {
            Size { cols: 10, rows: 2 }
        }

        fn take_resize(&mut self) -> Option<Size> {
            match self.resize_at {
                Some((at, size)) if at == self.waits => Some(size),
                _ => None,
            }
        }

        fn wait_input(&mut self, _timeout: Duration, buf: &mut Vec<u8>) -> io::Result<Wait> {
            self.waits += 1;
            match self.script.pop_front() {
                Some(chunk) if chunk.is_empty() => Ok(Wait::Idle),
                Some(chunk) => {
                    buf.extend_from_slice(&chunk);
                    Ok(Wait::Input)
                }
                None => Ok(Wait::Closed),
            }
        }

        fn present(&mut self, bytes: &[u8]) -> io::Result<()> {
            if self.fail_present {
                return Err(io::Error::other("present failed"));
            }
            self.frames.push(bytes.to_vec());
            Ok(())
        }
    }

    /// Records keys, quits on `q`, paints the number of keys seen.
    #[derive(Default)]
    struct Counter {
        keys: Vec<KeyCode>,
        resized: Option<Size>,
        ticks: usize,
        quit_after_ticks: Option<usize>,
    }

    impl App for Counter {
        fn on_event(&mut self, event: &Event) -> Action {
            let Event::Key(KeyEvent { code, .. }) = event;
            self.keys.push(*code);
            if *code == KeyCode::Char('q') {
                Action::Quit
            } else {
                Action::Continue
            }
        }

        fn on_resize(&mut self, size: Size) {
            self.resized = Some(size);
        }

        fn on_tick(&mut self) -> (bool, Action) {
            self.ticks += 1;
            let quit = self.quit_after_ticks.is_some_and(|n| self.ticks >= n);
            (false, if quit { Action::Quit } else { Action::Continue })
        }

        fn paint(&mut self, frame: &mut FrameBuffer) {
            let text = self.keys.len().to_string();
            frame.paint_text(0, 0, &text, CellColor::Default, CellColor::Default, Attr::empty());
        }
    }

    fn run(console: Scripted, app: &mut Counter) -> (io::Result<()>, Scripted) {
        let mut event_loop = EventLoop::with_console(console, LoopConfig::default());
        let result = event_loop.run(app);
        (result, event_loop.console)
    }

    #[test]
    fn default_tick_is_120hz() {
        assert_eq!(LoopConfig::default().tick_interval_us, 8333);
    }

    #[test]
    fn quit_key_ends_the_loop_and_leaves() {
        let mut app = Counter::default();
        let (result, console) = run(Scripted::new(&[b"ab", b"q", b"zzz"]), &mut app);
        assert!(result.is_ok());
        assert_eq!(
            app.keys,
            vec![KeyCode::Char('a'), KeyCode::Char('b'), KeyCode::Char('q')]
        );
        assert!(console.entered && console.left);
    }

    #[test]
    fn closed_input_ends_the_loop() {
        let mut app = Counter::default();
        let (result, console) = run(Scripted::new(&[b"x"]), &mut app);
        assert!(result.is_ok());
        assert_eq!(app.ticks, 1);
        assert!(console.left);
    }

    #[test]
    fn idle_ticks_paint_only_when_something_changed() {
        let mut app = Counter::default();
        let (_, console) = run(Scripted::new(&[b"", b"", b"k", b""]), &mut app);
        // The first frame and the one after the key.
        assert_eq!(console.frames.len(), 2);
        assert_eq!(app.ticks, 4);
    }

    #[test]
    fn lone_escape_is_flushed_on_the_next_idle_wait() {
        let mut app = Counter::default();
        run(Scripted::new(&[b"\x1b", b""]), &mut app);
        assert_eq!(app.keys, vec![KeyCode::Escape]);
    }

    #[test]
    fn resize_reaches_the_app_and_redraws_in_full() {
        let mut app = Counter::default();
        let mut console = Scripted::new(&[b"", b""]);
        let bigger = Size { cols: 12, rows: 3 };
        console.resize_at = Some((2, bigger));
        let (_, console) = run(console, &mut app);
        assert_eq!(app.resized, Some(bigger));
        let last = String::from_utf8(console.frames[1].clone()).unwrap();
        assert!(last.contains("\x1b[2J"));
    }

    #[test]
    fn tick_can_quit() {
        let mut app = Counter {
            quit_after_ticks: Some(2),
            ..Counter::default()
        };
        let (result, _) = run(Scripted::new(&[b"", b"", b"", b""]), &mut app);
        assert!(result.is_ok());
        assert_eq!(app.ticks, 2);
    }

    #[test]
    fn loop_error_survives_a_failed_teardown() {
        let mut app = Counter::default();
        let mut console = Scripted::new(&[b""]);
        console.fail_present = true;
        console.fail_leave = true;
        let (result, console) = run(console, &mut app);
        assert_eq!(result.unwrap_err().to_string(), "present failed");
        assert!(console.left);
    }

    #[test]
    fn teardown_error_is_reported_after_a_clean_loop() {
        let mut app = Counter::default();
        let mut console = Scripted::new(&[]);
        console.fail_leave = true;
        let (result, _) = run(console, &mut app);
        assert_eq!(result.unwrap_err().to_string(), "leave failed");
    }
}
