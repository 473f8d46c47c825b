// SPDX-License-Identifier: MIT
//
// ShuffleApp — wires the engine to the event loop.
//
// Keys pick an effect and trigger it; every loop tick advances the running
// effect to the current time and asks for a repaint when a step ran:
//
//   stdin → parser → on_event → Shuffler::trigger → Stage (Surface)
//   tick  → on_tick → Shuffler::tick → Stage
//   paint → Stage::paint → framebuffer → Renderer → Console
//
// A trigger that arrives while an effect is running is dropped; the status
// bar says so and the log gets a warning.

use rand::Rng;
use shuffle_core::clock::Clock;
use shuffle_core::effect;
use shuffle_core::shuffler::{Ignored, Shuffler};
use shuffle_term::buffer::FrameBuffer;
use shuffle_term::event_loop::{Action, App};
use shuffle_term::input::{Event, KeyCode, KeyEvent};
use tracing::{info, warn};

use crate::stage::Stage;

const HELP: &str = "1 fx1  2 reader  3 clear-reader  4 fx6  ⏎ replay  q quit";

/// What a key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command<'a> {
    Play(&'a str),
    Quit,
}

/// Map a key to a command. Enter replays `configured`.
fn command_for<'a>(key: &KeyEvent, configured: &'a str) -> Option<Command<'a>> {
    if key.is_ctrl('c') {
        return Some(Command::Quit);
    }
    if !key.modifiers.is_empty() {
        return None;
    }
    match key.code {
        KeyCode::Char('1' | 'f') => Some(Command::Play(effect::FX1)),
        KeyCode::Char('2' | 'r') => Some(Command::Play(effect::READER)),
        KeyCode::Char('3' | 'c') => Some(Command::Play(effect::CLEAR_READER)),
        KeyCode::Char('4' | '6') => Some(Command::Play(effect::FX6)),
        KeyCode::Enter => Some(Command::Play(configured)),
        KeyCode::Char('q') | KeyCode::Escape => Some(Command::Quit),
        _ => None,
    }
}

// ─── App ────────────────────────────────────────────────────────────────────

pub struct ShuffleApp<C, R> {
    shuffler: Shuffler<C, R>,
    stage: Stage,
    /// Effect for Enter and autoplay.
    effect: String,
    /// Quit once the first effect has settled.
    once: bool,
    message: Option<String>,
}

impl<C: Clock, R: Rng> ShuffleApp<C, R> {
    pub const fn new(shuffler: Shuffler<C, R>, stage: Stage, effect: String, once: bool) -> Self {
        Self {
            shuffler,
            stage,
            effect,
            once,
            message: None,
        }
    }

    /// Trigger the configured effect.
    pub fn play(&mut self) {
        let name = self.effect.clone();
        self.trigger(&name);
    }

    fn trigger(&mut self, name: &str) {
        match self.shuffler.trigger(name, &mut self.stage) {
            Ok(started) => {
                info!(effect = %started.effect, cells = started.cells, "playing");
                self.message = None;
            }
            Err(err @ Ignored::AlreadyAnimating) => {
                warn!(effect = name, "trigger refused: {err}");
                self.message = Some(format!("{name}: busy"));
            }
            Err(err @ Ignored::UnknownEffect(_)) => {
                warn!(effect = name, "trigger refused: {err}");
                self.message = Some(err.to_string());
            }
        }
    }

    #[must_use]
    pub const fn shuffler(&self) -> &Shuffler<C, R> {
        &self.shuffler
    }

    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    fn status(&self) -> String {
        let block = self.shuffler.block();
        let state = match self.shuffler.running() {
            Some(name) => format!("{name} {}/{}", block.settled(), block.total_cells()),
            None => "idle".to_owned(),
        };
        match &self.message {
            Some(msg) => format!("{state} │ {msg} │ {HELP}"),
            None => format!("{state} │ {HELP}"),
        }
    }
}

impl<C: Clock, R: Rng> App for ShuffleApp<C, R> {
    fn on_event(&mut self, event: &Event) -> Action {
        let Event::Key(key) = event;
        match command_for(key, &self.effect) {
            Some(Command::Quit) => Action::Quit,
            Some(Command::Play(name)) => {
                let name = name.to_owned();
                self.trigger(&name);
                Action::Continue
            }
            None => Action::Continue,
        }
    }

    fn on_tick(&mut self) -> (bool, Action) {
        let report = self.shuffler.tick(&mut self.stage);
        let action = if self.once && !self.shuffler.is_animating() {
            Action::Quit
        } else {
            Action::Continue
        };
        (report.changed(), action)
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        self.stage.paint(frame, &self.status());
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
