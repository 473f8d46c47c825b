// SPDX-License-Identifier: MIT
//
// Command-line arguments.
//
// Everything here overrides the config file. The text to animate comes from
// `--text`, else the positional FILE, else a built-in sample.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

/// Log verbosity for `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::OFF,
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shuffle")]
#[command(about = "Scramble a block of text in the terminal and let it settle back")]
#[command(version)]
pub struct Cli {
    /// File whose contents to animate
    #[arg(value_name = "FILE", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Animate this text instead of a file
    #[arg(short, long)]
    pub text: Option<String>,

    /// Effect to play on start and on Enter (fx1, reader, clear-reader, fx6, or a configured one)
    #[arg(short, long)]
    pub effect: Option<String>,

    /// Seed the random source for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Play the effect once and exit when every character has settled
    #[arg(long)]
    pub once: bool,

    /// Print the available effect names and exit
    #[arg(long)]
    pub list: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/shuffle/config.toml)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file; nothing is logged without it
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log level; falls back to the SHUFFLE_LOG filter, then off
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,
}
