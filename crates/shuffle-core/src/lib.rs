//! # shuffle-core — text shuffle engine
//!
//! Animates a block of text by replacing every character with random glyphs
//! for a few steps and then settling it back. Each character runs its own
//! small timed state machine; the block tracks when the last one settles.
//!
//! - **[`segment`]** — split text into lines → words → grapheme units
//! - **[`block`]** — `TextBlock`, `Line`, `Cell`: the addressable units and
//!   the animation token
//! - **[`surface`]** — the `Surface` trait the engine writes display state into
//! - **[`palette`]** — glyph palettes and the built-in colors
//! - **[`effect`]** — effect profiles (iterations, timing, stagger, color
//!   policy) and the registry of named effects
//! - **[`timeline`]** / **[`clock`]** — virtual-time timer queue and the
//!   injectable clock that drives it
//! - **[`run`]** — one in-flight effect: per-cell phases and step execution
//! - **[`shuffler`]** — trigger/dispatch with one-effect-at-a-time exclusion
//!
//! Everything runs on the caller's thread. The host calls
//! [`Shuffler::tick`](shuffler::Shuffler::tick) at its own cadence and every
//! step that came due since the last tick executes in due-time order.

pub mod block;
pub mod clock;
pub mod effect;
pub mod palette;
pub mod run;
pub mod segment;
pub mod shuffler;
pub mod surface;
pub mod timeline;
