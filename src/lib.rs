//! Stopwatch / countdown timer core for a six-digit multiplexed 7-segment display
//!
//! The firmware is a single blocking main loop that, on every iteration:
//! 1. polls the adjustment buttons for press edges
//! 2. consumes the 1 Hz tick mailbox and advances, retreats or alarms
//! 3. refreshes exactly one of the six displays
//!
//! A periodic tick source and three edge-triggered control lines (reset,
//! pause, resume) run in interrupt context and write the same
//! [`SharedState`](state::SharedState) block without locks.
//!
//! Everything here is `no_std` and independent of the chip. The STM32F103
//! wiring lives in `src/bin/stopwatch.rs` behind the `firmware` feature.

#![cfg_attr(not(test), no_std)]

// Must stay first so the logging macros are in scope for every module below.
#[macro_use]
mod fmt;

pub mod buttons;
pub mod config;
pub mod controller;
pub mod display;
pub mod engine;
pub mod hardware;
pub mod interrupts;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod state;
pub mod time;

pub use config::StopwatchConfig;
pub use controller::Controller;
pub use state::{Mode, SharedState};
pub use time::{Digits, Time};
