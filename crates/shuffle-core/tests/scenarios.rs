//! End-to-end engine scenarios: a text block, a recording surface, a manual
//! clock and a seeded RNG, stepped through whole effects.

use std::time::Duration;

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use shuffle_core::block::{CellAddr, TextBlock};
use shuffle_core::clock::ManualClock;
use shuffle_core::effect::{self, EffectProfile, Stagger, StaggerBasis};
use shuffle_core::palette::{self, NBSP, Palette};
use shuffle_core::run::{Phase, TickReport};
use shuffle_core::shuffler::{Ignored, Shuffler};
use shuffle_core::surface::{RecordingSurface, SurfaceWrite};
use shuffle_term::color::CellColor;

const TEXT: CellColor = CellColor::Rgb(0xe0, 0xe0, 0xe0);

type TestShuffler = Shuffler<ManualClock, StdRng>;

fn two_by_three() -> TextBlock {
    TextBlock::from_lines([vec!["a", "b", "c"], vec!["d", "e", "f"]], TEXT)
}

fn shuffler(block: TextBlock, seed: u64) -> (TestShuffler, ManualClock) {
    let clock = ManualClock::new();
    (Shuffler::new(block, clock.clone(), StdRng::seed_from_u64(seed)), clock)
}

/// Jump the clock from due time to due time until the run ends. Returns the
/// accumulated report and checks the token on the way.
fn drain(s: &mut TestShuffler, clock: &ManualClock, surface: &mut RecordingSurface) -> TickReport {
    let mut total = TickReport::default();
    while let Some(due) = s.next_due() {
        assert!(s.is_animating(), "token released with steps still queued");
        clock.set(due);
        let r = s.tick(surface);
        total.steps += r.steps;
        total.settled += r.settled;
        total.finished |= r.finished;
    }
    total
}

// -- Rest state ---------------------------------------------------------------

#[test]
fn fresh_block_is_at_rest() {
    let block = two_by_three();
    assert!(block.is_at_rest());
    assert!(!block.is_animating());
    for (_, cell) in block.cells() {
        assert_eq!(cell.state(), cell.original());
        assert_eq!(cell.color(), cell.original_color());
    }
}

// -- Scenarios ----------------------------------------------------------------

#[test]
fn two_lines_three_cells_settle_six_times() {
    let (mut s, clock) = shuffler(two_by_three(), 1);
    let mut surface = RecordingSurface::new();

    let started = s.trigger(effect::READER, &mut surface).unwrap();
    assert_eq!(started.cells, 6);
    assert_eq!(s.block().total_cells(), 6);

    let report = drain(&mut s, &clock, &mut surface);
    assert_eq!(report.settled, 6);
    assert_eq!(report.steps, 6 * 5);
    assert!(report.finished);
    assert_eq!(s.block().settled(), 6);

    let contents: Vec<_> = s.block().cells().map(|(_, c)| c.state().to_owned()).collect();
    assert_eq!(contents, vec!["a", "b", "c", "d", "e", "f"]);
    assert!(!s.is_animating());
}

#[test]
fn empty_block_trigger_changes_nothing() {
    let (mut s, clock) = shuffler(TextBlock::empty(), 1);
    let mut surface = RecordingSurface::new();

    for name in effect::BUILTIN_NAMES {
        let started = s.trigger(name, &mut surface).unwrap();
        assert_eq!(started.cells, 0);
        assert!(!s.is_animating());
    }
    clock.advance(Duration::from_secs(60));
    assert_eq!(s.tick(&mut surface), TickReport::default());
    assert!(surface.writes.is_empty());
}

#[test]
fn single_iteration_cell_settles_on_first_step() {
    let profile = EffectProfile::new(
        "once",
        1,
        100..=100,
        Stagger::fixed(StaggerBasis::Cell, 50),
        Palette::blocks(),
    )
    .unwrap();
    let block = TextBlock::from_lines([vec!["A"]], TEXT);
    let (mut s, clock) = shuffler(block, 1);
    s.register(profile);
    let mut surface = RecordingSurface::new();
    let addr = CellAddr::new(0, 0);

    s.trigger("once", &mut surface).unwrap();
    assert_eq!(s.phase(addr), Some(Phase::Pending));
    assert_eq!(s.next_due(), Some(Duration::from_millis(50)));

    clock.set(Duration::from_millis(50));
    let report = s.tick(&mut surface);
    assert_eq!(report, TickReport { steps: 1, settled: 1, finished: true });
    assert_eq!(surface.contents_at(addr), vec![NBSP, "A"]);
    assert!(!s.is_animating());
    assert!(s.block().is_at_rest());
}

// -- Round trips ----------------------------------------------------------------

fn play(name: &str, seed: u64) -> (TestShuffler, RecordingSurface) {
    let (mut s, clock) = shuffler(two_by_three(), seed);
    let mut surface = RecordingSurface::new();
    s.trigger(name, &mut surface).unwrap();
    drain(&mut s, &clock, &mut surface);
    (s, surface)
}

#[test]
fn fx1_returns_to_rest() {
    let (s, surface) = play(effect::FX1, 7);
    assert!(s.block().is_at_rest());

    let palette = Palette::alphanumeric();
    for w in &surface.writes {
        match w {
            SurfaceWrite::Content(addr, c) => {
                let original = s.block().cell(*addr).unwrap().original();
                assert!(c == NBSP || c == original || palette.contains(c), "unexpected {c:?}");
            }
            SurfaceWrite::Color(_, color) => {
                assert!(palette::FX1_GRAYS.contains(color) || *color == TEXT);
            }
        }
    }
}

#[test]
fn reader_restores_content_and_keeps_accent() {
    let (s, _) = play(effect::READER, 7);
    assert!(s.block().content_restored());
    for (_, cell) in s.block().cells() {
        assert_eq!(cell.color(), palette::READER_ACCENT);
    }
}

#[test]
fn clear_reader_restores_content_and_settles_dark() {
    let (s, surface) = play(effect::CLEAR_READER, 7);
    assert!(s.block().content_restored());
    for (_, cell) in s.block().cells() {
        assert_eq!(cell.color(), CellColor::BLACK);
    }
    // No blanking pass.
    assert!(!surface.writes.iter().any(|w| matches!(w, SurfaceWrite::Content(_, c) if c == NBSP)));
}

#[test]
fn fx6_returns_to_rest() {
    let (s, surface) = play(effect::FX6, 7);
    assert!(s.block().is_at_rest());
    let addr = CellAddr::new(1, 2);
    // Blank, 59 scrambles, settle.
    assert_eq!(surface.contents_at(addr).len(), 61);
    assert!(surface.colors_at(addr).is_empty());
}

// -- Exclusion ----------------------------------------------------------------

#[test]
fn token_held_from_trigger_to_last_settle() {
    let (mut s, clock) = shuffler(two_by_three(), 3);
    let mut surface = RecordingSurface::new();
    assert!(!s.is_animating());

    s.trigger(effect::FX1, &mut surface).unwrap();
    assert!(s.is_animating());

    while let Some(due) = s.next_due() {
        assert!(s.is_animating());
        clock.set(due);
        let report = s.tick(&mut surface);
        assert_eq!(report.finished, !s.is_animating());
    }
    assert_eq!(s.block().settled(), s.block().total_cells());
}

#[test]
fn retrigger_while_running_changes_nothing() {
    let baseline = {
        let (s, surface) = play(effect::FX1, 21);
        assert!(s.block().is_at_rest());
        surface.writes
    };

    let (mut s, clock) = shuffler(two_by_three(), 21);
    let mut surface = RecordingSurface::new();
    s.trigger(effect::FX1, &mut surface).unwrap();

    let mut refused = 0;
    while let Some(due) = s.next_due() {
        clock.set(due);
        s.tick(&mut surface);
        if s.is_animating() {
            for name in effect::BUILTIN_NAMES {
                assert_eq!(s.trigger(name, &mut surface), Err(Ignored::AlreadyAnimating));
                refused += 1;
            }
        }
    }

    assert!(refused > 0);
    assert_eq!(surface.writes, baseline);
}

#[test]
fn unknown_effect_changes_nothing() {
    let (mut s, clock) = shuffler(two_by_three(), 5);
    let mut surface = RecordingSurface::new();

    for name in ["", "FX1", "fx2", "clear reader"] {
        assert_eq!(
            s.trigger(name, &mut surface),
            Err(Ignored::UnknownEffect(name.to_owned()))
        );
    }
    clock.advance(Duration::from_secs(5));
    s.tick(&mut surface);

    assert!(surface.writes.is_empty());
    assert!(!s.is_animating());
    assert!(s.block().is_at_rest());
}

#[test]
fn same_seed_same_run() {
    let (_, a) = play(effect::READER, 99);
    let (_, b) = play(effect::READER, 99);
    assert_eq!(a.writes, b.writes);
}
