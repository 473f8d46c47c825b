//! Effect profiles — the parameters of the shared scramble state machine.
//!
//! Every effect runs the same per-cell sequence (see [`run`](crate::run)).
//! What differs is captured here:
//!
//! | | iterations | delay (ms) | stagger | palette | scramble color | settle color | blank first |
//! |---|---|---|---|---|---|---|---|
//! | `fx1` | 5 | 100–810 | line, `(line+1)·100·rand(1..=4)` | alphanumeric | random gray | restore | yes |
//! | `reader` | 5 | 100–410 | cell, `(cell+1)·10·rand(1..=4)` | blocks | accent | keep | yes |
//! | `clear-reader` | 5 | 100–410 | cell, `(cell+1)·5·rand(1..=4)` | blocks | keep | black | no |
//! | `fx6` | 60 | 30–110 | cell, `(cell+1)·30` | blocks | keep | keep | yes |
//!
//! `clear-reader` is the only built-in that does not blank the text first:
//! it is meant to follow `reader` and resolve the text it left behind.
//!
//! Profiles are immutable once built. Additional named profiles can be
//! registered in an [`EffectRegistry`] at runtime.

use std::num::NonZeroU32;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use shuffle_term::color::CellColor;

use crate::palette::{self, Palette};

/// Name of the default effect.
pub const FX1: &str = "fx1";
pub const READER: &str = "reader";
pub const CLEAR_READER: &str = "clear-reader";
pub const FX6: &str = "fx6";

/// Built-in effect names, in registry order.
pub const BUILTIN_NAMES: [&str; 4] = [FX1, READER, CLEAR_READER, FX6];

// ---------------------------------------------------------------------------
// ProfileError
// ---------------------------------------------------------------------------

/// Why a profile could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("effect name must not be empty")]
    EmptyName,

    #[error("effect needs at least one iteration")]
    ZeroIterations,

    #[error("delay range {min}..={max} ms is inverted")]
    InvertedDelay { min: u64, max: u64 },

    #[error("stagger jitter {min}..={max} is inverted")]
    InvertedJitter { min: u64, max: u64 },

    #[error("glyph palette must contain at least one glyph")]
    EmptyPalette,

    #[error("glyph {0:?} contains a control character")]
    ControlGlyph(String),

    #[error("random scramble color needs at least one color")]
    EmptyColors,
}

// ---------------------------------------------------------------------------
// Stagger
// ---------------------------------------------------------------------------

/// What the start delay is proportional to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerBasis {
    /// `(line position + 1)`: every cell of a line shares a base delay.
    Line,
    /// `(cell position + 1)`: delays grow along each line.
    Cell,
}

/// Start delay before a cell's first step:
/// `(index + 1) × unit × rand(jitter)`, drawn per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stagger {
    basis: StaggerBasis,
    unit_ms: u64,
    jitter: RangeInclusive<u64>,
}

impl Stagger {
    /// # Errors
    ///
    /// [`ProfileError::InvertedJitter`] if the jitter range is empty.
    pub fn new(
        basis: StaggerBasis,
        unit_ms: u64,
        jitter: RangeInclusive<u64>,
    ) -> Result<Self, ProfileError> {
        if jitter.start() > jitter.end() {
            return Err(ProfileError::InvertedJitter {
                min: *jitter.start(),
                max: *jitter.end(),
            });
        }
        Ok(Self {
            basis,
            unit_ms,
            jitter,
        })
    }

    /// Fixed delay with no random factor.
    #[must_use]
    pub const fn fixed(basis: StaggerBasis, unit_ms: u64) -> Self {
        Self {
            basis,
            unit_ms,
            jitter: 1..=1,
        }
    }

    #[must_use]
    pub const fn basis(&self) -> StaggerBasis {
        self.basis
    }

    /// Start delay for the cell at `cell_pos` on the line at `line_pos`.
    pub fn delay<R: Rng + ?Sized>(&self, line_pos: usize, cell_pos: usize, rng: &mut R) -> Duration {
        let index = match self.basis {
            StaggerBasis::Line => line_pos,
            StaggerBasis::Cell => cell_pos,
        };
        let factor = if self.jitter.start() == self.jitter.end() {
            *self.jitter.start()
        } else {
            rng.random_range(self.jitter.clone())
        };
        let steps = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1);
        Duration::from_millis(steps.saturating_mul(self.unit_ms).saturating_mul(factor))
    }
}

// ---------------------------------------------------------------------------
// Color policies
// ---------------------------------------------------------------------------

/// Color applied on every scrambling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrambleColor {
    /// Leave the color alone.
    Keep,
    /// Always this color.
    Fixed(CellColor),
    /// A uniformly random pick per step.
    Random(Vec<CellColor>),
}

impl ScrambleColor {
    /// # Errors
    ///
    /// [`ProfileError::EmptyColors`] if `colors` is empty.
    pub fn random(colors: Vec<CellColor>) -> Result<Self, ProfileError> {
        if colors.is_empty() {
            return Err(ProfileError::EmptyColors);
        }
        Ok(Self::Random(colors))
    }

    /// The color to apply this step, or `None` to leave it.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellColor> {
        match self {
            Self::Keep => None,
            Self::Fixed(c) => Some(*c),
            Self::Random(colors) => colors.choose(rng).copied(),
        }
    }
}

/// Color applied on the settling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleColor {
    /// Back to the cell's original color.
    Restore,
    /// Whatever the last scrambling step left.
    Keep,
    /// Always this color.
    Fixed(CellColor),
}

impl SettleColor {
    /// The color to apply on settle given the cell's original, or `None`.
    #[must_use]
    pub const fn resolve(self, original: CellColor) -> Option<CellColor> {
        match self {
            Self::Restore => Some(original),
            Self::Keep => None,
            Self::Fixed(c) => Some(c),
        }
    }
}

// ---------------------------------------------------------------------------
// EffectProfile
// ---------------------------------------------------------------------------

/// A named parameterization of the scramble state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectProfile {
    name: String,
    iterations: NonZeroU32,
    delay_ms: RangeInclusive<u64>,
    stagger: Stagger,
    palette: Palette,
    scramble_color: ScrambleColor,
    settle_color: SettleColor,
    blank_first: bool,
}

impl EffectProfile {
    /// A profile with no color changes that blanks the text first.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, zero iterations, or an inverted delay range.
    pub fn new(
        name: impl Into<String>,
        iterations: u32,
        delay_ms: RangeInclusive<u64>,
        stagger: Stagger,
        palette: Palette,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let iterations = NonZeroU32::new(iterations).ok_or(ProfileError::ZeroIterations)?;
        if delay_ms.start() > delay_ms.end() {
            return Err(ProfileError::InvertedDelay {
                min: *delay_ms.start(),
                max: *delay_ms.end(),
            });
        }
        Ok(Self {
            name,
            iterations,
            delay_ms,
            stagger,
            palette,
            scramble_color: ScrambleColor::Keep,
            settle_color: SettleColor::Keep,
            blank_first: true,
        })
    }

    #[must_use]
    pub fn with_scramble_color(mut self, policy: ScrambleColor) -> Self {
        self.scramble_color = policy;
        self
    }

    #[must_use]
    pub fn with_settle_color(mut self, policy: SettleColor) -> Self {
        self.settle_color = policy;
        self
    }

    #[must_use]
    pub fn with_blank_first(mut self, blank_first: bool) -> Self {
        self.blank_first = blank_first;
        self
    }

    // -- Built-ins ----------------------------------------------------------

    /// Line-staggered alphanumeric scramble in flickering grays.
    #[must_use]
    pub fn fx1() -> Self {
        Self::builtin(
            FX1,
            5,
            100..=810,
            Stagger {
                basis: StaggerBasis::Line,
                unit_ms: 100,
                jitter: 1..=4,
            },
            Palette::alphanumeric(),
        )
        .with_scramble_color(ScrambleColor::Random(palette::FX1_GRAYS.to_vec()))
        .with_settle_color(SettleColor::Restore)
    }

    /// Left-to-right block-shade wipe in the accent color.
    #[must_use]
    pub fn reader() -> Self {
        Self::builtin(
            READER,
            5,
            100..=410,
            Stagger {
                basis: StaggerBasis::Cell,
                unit_ms: 10,
                jitter: 1..=4,
            },
            Palette::blocks(),
        )
        .with_scramble_color(ScrambleColor::Fixed(palette::READER_ACCENT))
    }

    /// Faster block-shade wipe that settles dark without blanking first.
    #[must_use]
    pub fn clear_reader() -> Self {
        Self::builtin(
            CLEAR_READER,
            5,
            100..=410,
            Stagger {
                basis: StaggerBasis::Cell,
                unit_ms: 5,
                jitter: 1..=4,
            },
            Palette::blocks(),
        )
        .with_settle_color(SettleColor::Fixed(palette::CLEAR_READER_DARK))
        .with_blank_first(false)
    }

    /// Long block-shade shimmer, sixty steps per cell.
    #[must_use]
    pub fn fx6() -> Self {
        Self::builtin(
            FX6,
            60,
            30..=110,
            Stagger::fixed(StaggerBasis::Cell, 30),
            Palette::blocks(),
        )
    }

    fn builtin(
        name: &str,
        iterations: u32,
        delay_ms: RangeInclusive<u64>,
        stagger: Stagger,
        palette: Palette,
    ) -> Self {
        Self {
            name: name.to_owned(),
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            delay_ms,
            stagger,
            palette,
            scramble_color: ScrambleColor::Keep,
            settle_color: SettleColor::Keep,
            blank_first: true,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    #[must_use]
    pub const fn delay_ms(&self) -> &RangeInclusive<u64> {
        &self.delay_ms
    }

    #[must_use]
    pub const fn stagger(&self) -> &Stagger {
        &self.stagger
    }

    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub const fn scramble_color(&self) -> &ScrambleColor {
        &self.scramble_color
    }

    #[must_use]
    pub const fn settle_color(&self) -> SettleColor {
        self.settle_color
    }

    #[must_use]
    pub const fn blank_first(&self) -> bool {
        self.blank_first
    }

    /// A uniformly random wait between two steps.
    pub fn step_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(self.delay_ms.clone()))
    }
}

// ---------------------------------------------------------------------------
// EffectRegistry
// ---------------------------------------------------------------------------

/// Named effects, in registration order.
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    profiles: Vec<EffectProfile>,
}

impl EffectRegistry {
    /// The four built-in effects.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                EffectProfile::fx1(),
                EffectProfile::reader(),
                EffectProfile::clear_reader(),
                EffectProfile::fx6(),
            ],
        }
    }

    /// A registry with nothing in it.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Add `profile`, replacing and returning any profile with the same name.
    pub fn register(&mut self, profile: EffectProfile) -> Option<EffectProfile> {
        if let Some(slot) = self.profiles.iter_mut().find(|p| p.name == profile.name) {
            return Some(std::mem::replace(slot, profile));
        }
        self.profiles.push(profile);
        None
    }

    /// Look up a profile by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EffectProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(EffectProfile::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectProfile> {
        self.profiles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    // -- Built-in table -----------------------------------------------------

    #[test]
    fn builtin_parameters() {
        let fx1 = EffectProfile::fx1();
        assert_eq!(fx1.iterations().get(), 5);
        assert_eq!(fx1.delay_ms(), &(100..=810));
        assert_eq!(fx1.stagger().basis(), StaggerBasis::Line);
        assert_eq!(fx1.palette().len(), 58);
        assert_eq!(fx1.settle_color(), SettleColor::Restore);
        assert!(fx1.blank_first());

        let reader = EffectProfile::reader();
        assert_eq!(reader.delay_ms(), &(100..=410));
        assert_eq!(reader.scramble_color(), &ScrambleColor::Fixed(palette::READER_ACCENT));
        assert_eq!(reader.settle_color(), SettleColor::Keep);
        assert!(reader.blank_first());

        let clear = EffectProfile::clear_reader();
        assert_eq!(clear.scramble_color(), &ScrambleColor::Keep);
        assert_eq!(clear.settle_color(), SettleColor::Fixed(CellColor::BLACK));
        assert!(!clear.blank_first());

        let fx6 = EffectProfile::fx6();
        assert_eq!(fx6.iterations().get(), 60);
        assert_eq!(fx6.delay_ms(), &(30..=110));
        assert_eq!(fx6.scramble_color(), &ScrambleColor::Keep);
        assert_eq!(fx6.settle_color(), SettleColor::Keep);
    }

    #[test]
    fn builtin_palettes_are_independent() {
        assert_eq!(EffectProfile::fx1().palette(), &Palette::alphanumeric());
        assert_eq!(EffectProfile::reader().palette(), &Palette::blocks());
        assert_eq!(EffectProfile::fx6().palette(), &Palette::blocks());
    }

    // -- Stagger ------------------------------------------------------------

    #[test]
    fn line_stagger_bounds() {
        let s = EffectProfile::fx1().stagger().clone();
        let mut rng = rng();
        for _ in 0..50 {
            let d = s.delay(2, 7, &mut rng).as_millis();
            assert!((300..=1200).contains(&d), "{d}");
            assert_eq!(d % 300, 0);
        }
    }

    #[test]
    fn cell_stagger_bounds() {
        let s = EffectProfile::reader().stagger().clone();
        let mut rng = rng();
        for _ in 0..50 {
            let d = s.delay(9, 0, &mut rng).as_millis();
            assert!((10..=40).contains(&d), "{d}");
        }
    }

    #[test]
    fn fixed_stagger_is_exact() {
        let s = EffectProfile::fx6().stagger().clone();
        let mut rng = rng();
        assert_eq!(s.delay(0, 0, &mut rng), Duration::from_millis(30));
        assert_eq!(s.delay(5, 3, &mut rng), Duration::from_millis(120));
    }

    #[test]
    fn inverted_jitter_is_rejected() {
        assert_eq!(
            Stagger::new(StaggerBasis::Cell, 10, 4..=1),
            Err(ProfileError::InvertedJitter { min: 4, max: 1 })
        );
    }

    // -- Colors -------------------------------------------------------------

    #[test]
    fn scramble_color_pick() {
        let mut rng = rng();
        assert_eq!(ScrambleColor::Keep.pick(&mut rng), None);
        assert_eq!(
            ScrambleColor::Fixed(CellColor::BLACK).pick(&mut rng),
            Some(CellColor::BLACK)
        );
        let grays = palette::FX1_GRAYS.to_vec();
        let random = ScrambleColor::random(grays.clone()).unwrap();
        for _ in 0..20 {
            assert!(grays.contains(&random.pick(&mut rng).unwrap()));
        }
        assert_eq!(ScrambleColor::random(Vec::new()), Err(ProfileError::EmptyColors));
    }

    #[test]
    fn settle_color_resolve() {
        let orig = CellColor::Rgb(9, 9, 9);
        assert_eq!(SettleColor::Restore.resolve(orig), Some(orig));
        assert_eq!(SettleColor::Keep.resolve(orig), None);
        assert_eq!(
            SettleColor::Fixed(CellColor::BLACK).resolve(orig),
            Some(CellColor::BLACK)
        );
    }

    // -- Validation ---------------------------------------------------------

    #[test]
    fn new_validates() {
        let stagger = Stagger::fixed(StaggerBasis::Cell, 1);
        let blocks = Palette::blocks();
        assert_eq!(
            EffectProfile::new("", 3, 1..=2, stagger.clone(), blocks.clone()),
            Err(ProfileError::EmptyName)
        );
        assert_eq!(
            EffectProfile::new("x", 0, 1..=2, stagger.clone(), blocks.clone()),
            Err(ProfileError::ZeroIterations)
        );
        assert_eq!(
            EffectProfile::new("x", 3, 9..=2, stagger.clone(), blocks.clone()),
            Err(ProfileError::InvertedDelay { min: 9, max: 2 })
        );
        let ok = EffectProfile::new("x", 1, 0..=0, stagger, blocks).unwrap();
        assert_eq!(ok.iterations().get(), 1);
        assert!(ok.blank_first());
    }

    #[test]
    fn step_delay_within_range() {
        let p = EffectProfile::fx6();
        let mut rng = rng();
        for _ in 0..100 {
            let d = p.step_delay(&mut rng).as_millis();
            assert!((30..=110).contains(&d));
        }
    }

    // -- Registry -----------------------------------------------------------

    #[test]
    fn registry_builtin_names_in_order() {
        let reg = EffectRegistry::builtin();
        assert_eq!(reg.names().collect::<Vec<_>>(), BUILTIN_NAMES);
        assert!(reg.contains("clear-reader"));
        assert!(!reg.contains("FX1"));
        assert!(reg.get("fx2").is_none());
    }

    #[test]
    fn register_appends_and_replaces() {
        let mut reg = EffectRegistry::builtin();
        let custom = EffectProfile::new(
            "slow",
            12,
            50..=200,
            Stagger::fixed(StaggerBasis::Cell, 20),
            Palette::blocks(),
        )
        .unwrap();
        assert!(reg.register(custom.clone()).is_none());
        assert_eq!(reg.len(), 5);

        let faster = EffectProfile::new(
            "fx6",
            3,
            1..=2,
            Stagger::fixed(StaggerBasis::Cell, 1),
            Palette::blocks(),
        )
        .unwrap();
        let old = reg.register(faster).unwrap();
        assert_eq!(old.iterations().get(), 60);
        assert_eq!(reg.get("fx6").unwrap().iterations().get(), 3);
        assert_eq!(reg.len(), 5);
    }
}
