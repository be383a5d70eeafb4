//! Handlers that run in interrupt context.
//!
//! They pre-empt the main loop at any point and write [`SharedState`]
//! directly. Each one is short and never waits.

use embedded_hal_async::digital::Wait;

use crate::state::{Mode, SharedState};
use crate::time::Time;

/// Periodic tick: posts the mailbox and counts alarm ticks.
pub fn on_tick(state: &SharedState) {
    if state.alarm_active() {
        state.count_alarm_tick();
    }
    state.post_tick();
}

/// Zeroes the time, returns to counting up and unpauses.
///
/// Leaves a sounding alarm alone; it still retires on schedule. A main-loop
/// update that this pre-empts is redone on top of the zeroed time.
pub fn on_reset(state: &SharedState) {
    state.update_time(Time::reset);
    state.set_mode(Mode::Increment);
    state.set_paused(false);
}

pub fn on_pause(state: &SharedState) {
    state.set_paused(true);
}

pub fn on_resume(state: &SharedState) {
    if state.is_paused() {
        state.set_paused(false);
    }
}

/// Line level transition that triggers a control interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Falling,
    Rising,
}

/// The three edge-triggered control inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlLine {
    Reset,
    Pause,
    Resume,
}

impl ControlLine {
    pub const ALL: [ControlLine; 3] = [ControlLine::Reset, ControlLine::Pause, ControlLine::Resume];

    /// Reset and resume are buttons to ground with the internal pull-up.
    /// Pause has an external pull-up and fires on release.
    pub const fn edge(self) -> Edge {
        match self {
            ControlLine::Reset | ControlLine::Resume => Edge::Falling,
            ControlLine::Pause => Edge::Rising,
        }
    }

    pub fn dispatch(self, state: &SharedState) {
        match self {
            ControlLine::Reset => on_reset(state),
            ControlLine::Pause => on_pause(state),
            ControlLine::Resume => on_resume(state),
        }
    }
}

/// Waits for `line`'s trigger edge on `pin`, then runs its handler.
pub async fn wait_control_line<P: Wait>(
    pin: &mut P,
    line: ControlLine,
    state: &SharedState,
) -> Result<(), P::Error> {
    match line.edge() {
        Edge::Falling => pin.wait_for_falling_edge().await?,
        Edge::Rising => pin.wait_for_rising_edge().await?,
    }
    line.dispatch(state);
    debug!("control line {}", line);
    Ok(())
}
