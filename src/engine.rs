//! Tick-driven time update and alarm state machine.

use crate::config::StopwatchConfig;
use crate::hardware::traits::{Buzzer, Led};
use crate::state::{Mode, SharedState, StateSnapshot};
use crate::time::Time;

/// Mode LEDs and the alarm buzzer.
pub struct Indicators<R, Y, Z> {
    red: R,
    yellow: Y,
    buzzer: Z,
}

impl<R: Led, Y: Led, Z: Buzzer> Indicators<R, Y, Z> {
    /// Takes the outputs and switches them all off.
    pub fn new(mut red: R, mut yellow: Y, mut buzzer: Z) -> Self {
        red.off();
        yellow.off();
        buzzer.stop();
        Self { red, yellow, buzzer }
    }

    /// Red while counting up, yellow while counting down.
    pub fn show_mode(&mut self, mode: Mode) {
        self.red.set(mode == Mode::Increment);
        self.yellow.set(mode == Mode::Countdown);
    }

    pub fn sound(&mut self) {
        self.buzzer.start();
    }

    pub fn silence(&mut self) {
        self.buzzer.stop();
    }
}

/// What consuming one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineEvent {
    Advanced(Time),
    Retreated(Time),
    /// Paused: time held, mode LEDs refreshed.
    Frozen,
    AlarmStarted,
    /// Paused by the alarm, with the number of alarm ticks counted so far.
    AlarmSounding(u8),
    AlarmRetired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    IncrementRunning,
    IncrementPaused,
    CountdownRunning,
    CountdownPaused,
    AlarmSounding,
}

impl EngineState {
    /// The buzzer keeps sounding after Reset or Resume until the alarm
    /// retires, but the time runs again, so only a paused alarm counts as
    /// `AlarmSounding`.
    pub fn of(snapshot: &StateSnapshot) -> Self {
        match (snapshot.alarm_active, snapshot.mode, snapshot.paused) {
            (true, _, true) => EngineState::AlarmSounding,
            (_, Mode::Increment, false) => EngineState::IncrementRunning,
            (false, Mode::Increment, true) => EngineState::IncrementPaused,
            (_, Mode::Countdown, false) => EngineState::CountdownRunning,
            (false, Mode::Countdown, true) => EngineState::CountdownPaused,
        }
    }
}

pub struct TimeEngine {
    alarm_duration_ticks: u8,
}

impl TimeEngine {
    pub fn new(config: &StopwatchConfig) -> Self {
        Self {
            alarm_duration_ticks: config.alarm_duration_ticks,
        }
    }

    /// Consumes at most one pending tick. Returns `None` if there was none.
    ///
    /// A countdown that lands on 00:00:00 starts the alarm on that same tick,
    /// and a countdown tick that finds the time already at zero does too. The
    /// alarm pauses the time, so the display keeps showing 00:00:00 while the
    /// buzzer sounds. Reset or Resume clear the pause and the time runs again
    /// under the buzzer. Once the tick source has counted
    /// `alarm_duration_ticks` alarm ticks, the next tick retires the alarm
    /// instead of moving the time.
    pub fn update<R, Y, Z>(
        &self,
        state: &SharedState,
        indicators: &mut Indicators<R, Y, Z>,
    ) -> Option<EngineEvent>
    where
        R: Led,
        Y: Led,
        Z: Buzzer,
    {
        if !state.take_tick() {
            return None;
        }

        if state.alarm_active() && state.alarm_elapsed() >= self.alarm_duration_ticks {
            indicators.silence();
            state.set_mode(Mode::Increment);
            info!("alarm retired after {} ticks", state.alarm_elapsed());
            state.retire_alarm();
            state.set_paused(false);
            indicators.show_mode(Mode::Increment);
            return Some(EngineEvent::AlarmRetired);
        }

        let mode = state.mode();
        indicators.show_mode(mode);

        if state.is_paused() {
            return Some(if state.alarm_active() {
                EngineEvent::AlarmSounding(state.alarm_elapsed())
            } else {
                EngineEvent::Frozen
            });
        }

        let event = match mode {
            Mode::Increment => EngineEvent::Advanced(state.update_time(Time::advance)),
            Mode::Countdown if state.time().is_zero() => {
                state.refresh_digits();
                self.start_alarm(state, indicators)
            }
            Mode::Countdown => {
                let time = state.update_time(Time::retreat);
                if time.is_zero() {
                    self.start_alarm(state, indicators)
                } else {
                    EngineEvent::Retreated(time)
                }
            }
        };
        trace!("tick: {}", event);
        Some(event)
    }

    fn start_alarm<R, Y, Z>(
        &self,
        state: &SharedState,
        indicators: &mut Indicators<R, Y, Z>,
    ) -> EngineEvent
    where
        R: Led,
        Y: Led,
        Z: Buzzer,
    {
        state.set_paused(true);
        if state.alarm_active() {
            // already sounding: hold at zero, keep counting toward retirement
            return EngineEvent::AlarmSounding(state.alarm_elapsed());
        }
        indicators.sound();
        state.start_alarm();
        info!("countdown finished, alarm on");
        EngineEvent::AlarmStarted
    }
}
