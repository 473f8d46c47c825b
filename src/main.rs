// SPDX-License-Identifier: MIT
//
// shuffle — scramble a block of text in the terminal and let it settle back.
//
// This is the main binary that wires together both crates:
//
//   shuffle-core → segmenter, text block, effect profiles, scheduler
//   shuffle-term → terminal control, rendering, input parsing, event loop
//
// Startup:
//
//   args + config file → effect registry
//   text → segment → TextBlock + Stage (layout) → Shuffler
//   EventLoop::run(ShuffleApp)
//
// Logs go to `--log-file` only; the terminal is in alternate-screen mode
// while the loop runs.

mod app;
mod cli;
mod config;
mod stage;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use shuffle_core::block::TextBlock;
use shuffle_core::clock::SystemClock;
use shuffle_core::segment::segment;
use shuffle_core::shuffler::Shuffler;
use shuffle_term::event_loop::{EventLoop, LoopConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::app::ShuffleApp;
use crate::cli::Cli;
use crate::config::ShuffleConfig;
use crate::stage::Stage;

/// Shown when neither `--text` nor a file is given.
const SAMPLE: &str = "\
Every character runs its own little clock.
It flickers through a handful of random glyphs,
then lands back where it started.

Press 1-4 to pick an effect, Enter to replay, q to quit.";

// ─── Logging ────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };

    let filter = match cli.log_level {
        Some(level) => EnvFilter::default().add_directive(LevelFilter::from(level).into()),
        None => EnvFilter::try_from_env("SHUFFLE_LOG").unwrap_or_else(|_| EnvFilter::new("off")),
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ─── Input text ─────────────────────────────────────────────────────────────

fn load_text(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        None => Ok(SAMPLE.to_owned()),
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = ShuffleConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(effect) = &cli.effect {
        config.effect.clone_from(effect);
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let registry = config.registry().context("loading effects")?;

    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if !registry.contains(&config.effect) {
        bail!("unknown effect `{}` (see --list)", config.effect);
    }

    let text = load_text(&cli)?;
    let seg = segment(&text);
    let background = config.background_color()?;
    let block = TextBlock::from_segments(&seg, config.text_color()?, background);
    let mut stage = Stage::new(&seg, background);
    block.sync(&mut stage);
    debug!(lines = block.lines().len(), cells = block.total_cells(), "text loaded");

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let shuffler = Shuffler::with_registry(block, registry, SystemClock::new(), rng);
    let mut app = ShuffleApp::new(shuffler, stage, config.effect.clone(), cli.once);

    let mut event_loop = EventLoop::with_config(LoopConfig {
        tick_interval_us: config.tick_interval_us,
    });
    if config.autoplay || cli.once {
        app.play();
    }
    info!(effect = %config.effect, once = cli.once, "starting");

    event_loop.run(&mut app).context("terminal error")?;
    Ok(())
}
