// SPDX-License-Identifier: MIT
//
// shuffle-term — terminal presentation layer for shuffle.
//
// A small, direct terminal backend: cells and colors, a frame buffer,
// differential rendering that only touches cells that changed since the
// last frame, raw-mode terminal control, and a tick-driven event loop.
// A running shuffle rewrites a few glyphs per tick, so the diff keeps the
// output proportional to the animation rather than the screen.
//
// No TUI framework sits underneath; every escape sequence is written here.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod event_loop;
pub mod input;
pub mod render;
pub mod terminal;
