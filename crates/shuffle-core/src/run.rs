//! One in-flight effect — the per-cell scramble state machine.
//!
//! Every cell moves through
//!
//! ```text
//! Pending ──stagger──▶ Scrambling(0) ─▶ … ─▶ Scrambling(n-2) ─▶ Settled
//! ```
//!
//! where `n` is the profile's iteration count. Step `i < n-1` shows a random
//! glyph from the profile palette and applies the scramble color policy;
//! step `n-1` restores the original content, applies the settle color
//! policy and counts the cell as settled on the block. With `n == 1` the
//! first step is already the settling step.
//!
//! Each cell has at most one entry in the [`Timeline`] at any time: a step
//! schedules its own successor, so a cell's steps always run in order. The
//! successor is due `delay` after the predecessor's *due* time, not after
//! the tick that happened to run it, so a coarse host tick does not stretch
//! the animation.

use std::time::Duration;

use rand::Rng;
use tracing::trace;

use crate::block::{CellAddr, TextBlock};
use crate::effect::EffectProfile;
use crate::palette::NBSP;
use crate::surface::Surface;
use crate::timeline::Timeline;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a cell is in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for its stagger delay.
    Pending,
    /// Step `i` has run and shown a random glyph.
    Scrambling(u32),
    /// Back to original content; terminal for this run.
    Settled,
}

/// A queued step: which cell, which iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    addr: CellAddr,
    iteration: u32,
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What happened during one [`EffectRun::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Steps executed.
    pub steps: usize,
    /// Cells that reached [`Phase::Settled`].
    pub settled: usize,
    /// The last cell settled and the token was released.
    pub finished: bool,
}

impl TickReport {
    /// Whether anything visible changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.steps > 0
    }
}

// ---------------------------------------------------------------------------
// EffectRun
// ---------------------------------------------------------------------------

/// The state of one effect while it plays.
#[derive(Debug)]
pub struct EffectRun {
    profile: EffectProfile,
    timeline: Timeline<Step>,
    phases: Vec<Vec<Phase>>,
    started_at: Duration,
}

impl EffectRun {
    /// Start `profile` on `block` at time `now`.
    ///
    /// Blanks every cell first if the profile asks for it, then schedules
    /// each cell's first step after its stagger delay. The caller must
    /// already hold the block's token.
    pub fn start<S, R>(
        profile: EffectProfile,
        block: &mut TextBlock,
        surface: &mut S,
        rng: &mut R,
        now: Duration,
    ) -> Self
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let addrs: Vec<CellAddr> = block.cells().map(|(addr, _)| addr).collect();

        if profile.blank_first() {
            for &addr in &addrs {
                block.set(addr, NBSP, surface);
            }
        }

        let mut timeline = Timeline::new();
        for &addr in &addrs {
            let line_pos = block.lines()[addr.line].position();
            let cell_pos = block.lines()[addr.line].cells()[addr.cell].position();
            let delay = profile.stagger().delay(line_pos, cell_pos, rng);
            timeline.schedule(now.saturating_add(delay), Step { addr, iteration: 0 });
        }

        let phases = block
            .lines()
            .iter()
            .map(|line| vec![Phase::Pending; line.len()])
            .collect();

        Self {
            profile,
            timeline,
            phases,
            started_at: now,
        }
    }

    /// Run every step due at or before `now`, in due-time order.
    pub fn tick<S, R>(
        &mut self,
        now: Duration,
        block: &mut TextBlock,
        surface: &mut S,
        rng: &mut R,
    ) -> TickReport
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = TickReport::default();

        while let Some((due, step)) = self.timeline.pop_due(now) {
            report.steps += 1;
            let last = self.profile.iterations().get() - 1;
            block.remember(step.addr);

            if step.iteration >= last {
                self.settle(step.addr, block, surface);
                report.settled += 1;
                if block.record_settled() {
                    report.finished = true;
                }
            } else {
                self.scramble(step, block, surface, rng);
                let next = due.saturating_add(self.profile.step_delay(rng));
                self.timeline.schedule(
                    next,
                    Step {
                        addr: step.addr,
                        iteration: step.iteration + 1,
                    },
                );
            }
        }

        report
    }

    fn scramble<S, R>(&mut self, step: Step, block: &mut TextBlock, surface: &mut S, rng: &mut R)
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let glyph = self.profile.palette().choose(rng).to_owned();
        trace!(
            line = step.addr.line,
            cell = step.addr.cell,
            iteration = step.iteration,
            glyph = %glyph,
            "scramble"
        );
        block.set(step.addr, &glyph, surface);
        if let Some(color) = self.profile.scramble_color().pick(rng) {
            block.set_color(step.addr, color, surface);
        }
        self.set_phase(step.addr, Phase::Scrambling(step.iteration));
    }

    fn settle<S>(&mut self, addr: CellAddr, block: &mut TextBlock, surface: &mut S)
    where
        S: Surface + ?Sized,
    {
        let Some(cell) = block.cell(addr) else {
            return;
        };
        let original = cell.original().to_owned();
        let settle_color = self.profile.settle_color().resolve(cell.original_color());

        trace!(line = addr.line, cell = addr.cell, "settle");
        block.set(addr, &original, surface);
        if let Some(color) = settle_color {
            block.set_color(addr, color, surface);
        }
        self.set_phase(addr, Phase::Settled);
    }

    fn set_phase(&mut self, addr: CellAddr, phase: Phase) {
        if let Some(slot) = self
            .phases
            .get_mut(addr.line)
            .and_then(|l| l.get_mut(addr.cell))
        {
            *slot = phase;
        }
    }

    // -- Inspection ---------------------------------------------------------

    #[must_use]
    pub const fn profile(&self) -> &EffectProfile {
        &self.profile
    }

    /// Phase of the cell at `addr`.
    #[must_use]
    pub fn phase(&self, addr: CellAddr) -> Option<Phase> {
        self.phases.get(addr.line)?.get(addr.cell).copied()
    }

    /// Clock reading when the run started.
    #[must_use]
    pub const fn started_at(&self) -> Duration {
        self.started_at
    }

    /// When the next step is due, if any remain.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.timeline.next_due()
    }

    /// Steps still queued. At most one per cell.
    #[must_use]
    pub fn pending_steps(&self) -> usize {
        self.timeline.len()
    }

    /// Whether every cell has settled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.timeline.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
