//! Shuffler — trigger dispatch for one text block.
//!
//! The shuffler owns the [`TextBlock`], the [`EffectRegistry`], a
//! [`Clock`] and a random source. Triggering an effect by name starts an
//! [`EffectRun`] unless one is already in flight; ticking advances the run
//! to the clock's current time.
//!
//! A refused trigger has no side effects at all: no surface writes, no
//! random draws, no change to the running effect's timing.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::block::{CellAddr, TextBlock};
use crate::clock::Clock;
use crate::effect::{self, EffectProfile, EffectRegistry};
use crate::run::{EffectRun, Phase, TickReport};
use crate::surface::Surface;

// ---------------------------------------------------------------------------
// Trigger outcome
// ---------------------------------------------------------------------------

/// A trigger that took the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// Name of the effect that started.
    pub effect: String,
    /// Cells the effect will animate. Zero for an empty block, in which case
    /// nothing runs and the token is never taken.
    pub cells: usize,
}

/// Why a trigger did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ignored {
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),

    #[error("an effect is already running")]
    AlreadyAnimating,
}

// ---------------------------------------------------------------------------
// Shuffler
// ---------------------------------------------------------------------------

pub struct Shuffler<C, R> {
    block: TextBlock,
    registry: EffectRegistry,
    clock: C,
    rng: R,
    run: Option<EffectRun>,
}

impl<C: Clock, R: Rng> Shuffler<C, R> {
    /// A shuffler with the built-in effects.
    pub fn new(block: TextBlock, clock: C, rng: R) -> Self {
        Self::with_registry(block, EffectRegistry::builtin(), clock, rng)
    }

    pub const fn with_registry(block: TextBlock, registry: EffectRegistry, clock: C, rng: R) -> Self {
        Self {
            block,
            registry,
            clock,
            rng,
            run: None,
        }
    }

    /// Start the effect called `name`.
    ///
    /// # Errors
    ///
    /// [`Ignored::UnknownEffect`] if no such effect is registered (checked
    /// first), [`Ignored::AlreadyAnimating`] if another effect holds the
    /// token. Either way nothing changes.
    pub fn trigger<S>(&mut self, name: &str, surface: &mut S) -> Result<Started, Ignored>
    where
        S: Surface + ?Sized,
    {
        let Some(profile) = self.registry.get(name) else {
            debug!(effect = name, "trigger ignored: unknown effect");
            return Err(Ignored::UnknownEffect(name.to_owned()));
        };

        if self.block.is_empty() {
            debug!(effect = name, "trigger on empty block");
            return Ok(Started {
                effect: name.to_owned(),
                cells: 0,
            });
        }

        if !self.block.acquire() {
            debug!(effect = name, "trigger ignored: already animating");
            return Err(Ignored::AlreadyAnimating);
        }

        let profile: EffectProfile = profile.clone();
        let now = self.clock.now();
        let cells = self.block.total_cells();
        debug!(effect = name, cells, ?now, "effect started");

        self.run = Some(EffectRun::start(
            profile,
            &mut self.block,
            surface,
            &mut self.rng,
            now,
        ));

        Ok(Started {
            effect: name.to_owned(),
            cells,
        })
    }

    /// Start the default effect (`fx1`).
    ///
    /// # Errors
    ///
    /// Same as [`trigger`](Self::trigger).
    pub fn trigger_default<S>(&mut self, surface: &mut S) -> Result<Started, Ignored>
    where
        S: Surface + ?Sized,
    {
        self.trigger(effect::FX1, surface)
    }

    /// Run every step that is due at the clock's current time.
    pub fn tick<S>(&mut self, surface: &mut S) -> TickReport
    where
        S: Surface + ?Sized,
    {
        let Some(run) = self.run.as_mut() else {
            return TickReport::default();
        };

        let now = self.clock.now();
        let report = run.tick(now, &mut self.block, surface, &mut self.rng);
        if report.steps > 0 {
            trace!(steps = report.steps, settled = report.settled, "tick");
        }

        if report.finished {
            let elapsed = now.saturating_sub(run.started_at());
            debug!(effect = run.profile().name(), ?elapsed, "effect finished");
            self.run = None;
        }

        report
    }

    // -- Queries ------------------------------------------------------------

    /// Whether an effect holds the token.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.block.is_animating()
    }

    #[must_use]
    pub const fn block(&self) -> &TextBlock {
        &self.block
    }

    #[must_use]
    pub const fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Add or replace a named effect. Takes effect on the next trigger.
    pub fn register(&mut self, profile: EffectProfile) -> Option<EffectProfile> {
        self.registry.register(profile)
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Name of the running effect.
    #[must_use]
    pub fn running(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.profile().name())
    }

    /// When the next step is due. `None` when idle.
    #[must_use]
    pub fn next_due(&self) -> Option<std::time::Duration> {
        self.run.as_ref().and_then(EffectRun::next_due)
    }

    /// Phase of a cell in the running effect. `None` when idle.
    #[must_use]
    pub fn phase(&self, addr: CellAddr) -> Option<Phase> {
        self.run.as_ref()?.phase(addr)
    }
}

impl<C, R> std::fmt::Debug for Shuffler<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shuffler")
            .field("cells", &self.block.total_cells())
            .field("animating", &self.block.is_animating())
            .field("running", &self.run.as_ref().map(|r| r.profile().name()))
            .field("effects", &self.registry.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
