//! Deterministic stand-in for the board.
//!
//! [`SimBoard`] owns in-memory pins, a logical clock and the shared state.
//! [`Simulator`] runs the real [`Controller`] against them. The multiplex
//! hold advances the logical clock instead of spinning, and whenever the
//! clock crosses a tick boundary the tick handler runs right there, in the
//! middle of the main loop's busy-wait, the way the timer interrupt would.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::buttons::{ButtonAction, ButtonPanel};
use crate::config::{DISPLAY_COUNT, StopwatchConfig};
use crate::controller::{Controller, LoopReport};
use crate::display::Multiplexer;
use crate::engine::Indicators;
use crate::hardware::seven_segment::SevenSegmentBank;
use crate::hardware::{GpioButton, GpioBuzzer, GpioLed, Polarity};
use crate::interrupts::{self, ControlLine};
use crate::state::SharedState;

pub const PIN_COUNT: usize = 32;

const ENABLE_BASE: usize = 0;
const DATA_BASE: usize = ENABLE_BASE + DISPLAY_COUNT;
const DATA_LINES: usize = 4;
const RED_LED: usize = DATA_BASE + DATA_LINES;
const YELLOW_LED: usize = RED_LED + 1;
const BUZZER: usize = YELLOW_LED + 1;
const BUTTON_BASE: usize = 16;

/// Line levels of every simulated pin, `true` = high.
pub struct PinLog {
    levels: [Cell<bool>; PIN_COUNT],
}

impl PinLog {
    pub fn new() -> Self {
        Self {
            levels: Default::default(),
        }
    }

    pub fn output(&self, index: usize) -> SimOutput<'_> {
        SimOutput { log: self, index }
    }

    pub fn input(&self, index: usize) -> SimInput<'_> {
        SimInput { log: self, index }
    }

    pub fn level(&self, index: usize) -> bool {
        self.levels[index].get()
    }

    pub fn set_level(&self, index: usize, high: bool) {
        self.levels[index].set(high);
    }
}

impl Default for PinLog {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimOutput<'a> {
    log: &'a PinLog,
    index: usize,
}

impl ErrorType for SimOutput<'_> {
    type Error = Infallible;
}

impl OutputPin for SimOutput<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.set_level(self.index, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.set_level(self.index, true);
        Ok(())
    }
}

impl StatefulOutputPin for SimOutput<'_> {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.log.level(self.index))
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.log.level(self.index))
    }
}

pub struct SimInput<'a> {
    log: &'a PinLog,
    index: usize,
}

impl ErrorType for SimInput<'_> {
    type Error = Infallible;
}

impl InputPin for SimInput<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.log.level(self.index))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.log.level(self.index))
    }
}

/// Logical time plus the periodic tick source.
pub struct SimClock {
    now_ns: Cell<u64>,
    next_tick_ns: Cell<u64>,
    tick_period_ns: Option<u64>,
    ticks: Cell<u32>,
}

impl SimClock {
    fn new(tick_period_ms: Option<u32>) -> Self {
        let period = tick_period_ms.map(|ms| u64::from(ms) * 1_000_000);
        Self {
            now_ns: Cell::new(0),
            next_tick_ns: Cell::new(period.unwrap_or(u64::MAX)),
            tick_period_ns: period,
            ticks: Cell::new(0),
        }
    }

    fn advance(&self, ns: u64, state: &SharedState) {
        let target = self.now_ns.get() + ns;
        if let Some(period) = self.tick_period_ns {
            while self.next_tick_ns.get() <= target {
                interrupts::on_tick(state);
                self.ticks.set(self.ticks.get() + 1);
                self.next_tick_ns.set(self.next_tick_ns.get() + period);
            }
        }
        self.now_ns.set(target);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    /// Ticks delivered by the timer so far (injected ticks not included).
    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }
}

/// Busy-wait replacement that moves the logical clock forward.
pub struct SimDelay<'a> {
    clock: &'a SimClock,
    state: &'a SharedState,
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(u64::from(ns), self.state);
    }
}

pub type SimController<'a> = Controller<
    'a,
    GpioButton<SimInput<'a>>,
    GpioLed<SimOutput<'a>>,
    GpioLed<SimOutput<'a>>,
    GpioBuzzer<SimOutput<'a>>,
    SevenSegmentBank<SimOutput<'a>, SimOutput<'a>, DATA_LINES>,
    SimDelay<'a>,
>;

pub struct SimBoard {
    config: StopwatchConfig,
    state: SharedState,
    pins: PinLog,
    clock: SimClock,
}

impl SimBoard {
    /// A board whose timer ticks every `config.tick_period_ms` of logical time.
    pub fn new(config: StopwatchConfig) -> Self {
        Self::build(config, Some(config.tick_period_ms))
    }

    /// A board with the timer stopped; ticks only arrive via
    /// [`Simulator::tick`].
    pub fn manual(config: StopwatchConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: StopwatchConfig, tick_period_ms: Option<u32>) -> Self {
        let pins = PinLog::new();
        // pull-ups: idle buttons read high
        for action in ButtonAction::ALL {
            pins.set_level(BUTTON_BASE + action.index(), true);
        }
        Self {
            config,
            state: SharedState::new(),
            pins,
            clock: SimClock::new(tick_period_ms),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn simulator(&self) -> Simulator<'_> {
        let pins = &self.pins;
        let panel = ButtonPanel::new(core::array::from_fn(|i| {
            GpioButton::new(pins.input(BUTTON_BASE + i))
        }));
        let indicators = Indicators::new(
            GpioLed::new(pins.output(RED_LED), Polarity::ActiveHigh),
            GpioLed::new(pins.output(YELLOW_LED), Polarity::ActiveHigh),
            GpioBuzzer::new(pins.output(BUZZER)),
        );
        let bank = SevenSegmentBank::bcd(
            core::array::from_fn(|i| pins.output(ENABLE_BASE + i)),
            core::array::from_fn(|i| pins.output(DATA_BASE + i)),
        );
        let delay = SimDelay {
            clock: &self.clock,
            state: &self.state,
        };
        let mux = Multiplexer::new(bank, delay, &self.config);
        Simulator {
            board: self,
            controller: Controller::new(&self.state, panel, indicators, mux, &self.config),
        }
    }
}

pub struct Simulator<'a> {
    board: &'a SimBoard,
    controller: SimController<'a>,
}

impl<'a> Simulator<'a> {
    pub fn run_once(&mut self) -> LoopReport {
        self.controller.run_once()
    }

    /// Runs main-loop iterations until `ms` of logical time have passed.
    pub fn run_for_ms(&mut self, ms: u64) {
        let end = self.board.clock.now_ms() + ms;
        while self.board.clock.now_ms() < end {
            self.run_once();
        }
    }

    /// Runs until the timer has delivered `count` more ticks and the last
    /// one has been consumed. Never returns on a [`SimBoard::manual`] board.
    pub fn run_ticks(&mut self, count: u32) {
        let target = self.board.clock.ticks() + count;
        while self.board.clock.ticks() < target || self.board.state.tick_pending() {
            self.run_once();
        }
    }

    /// Fires the tick interrupt once and runs one main-loop iteration.
    pub fn tick(&mut self) -> LoopReport {
        interrupts::on_tick(&self.board.state);
        self.run_once()
    }

    pub fn press(&self, button: ButtonAction) {
        self.board.pins.set_level(BUTTON_BASE + button.index(), false);
    }

    pub fn release(&self, button: ButtonAction) {
        self.board.pins.set_level(BUTTON_BASE + button.index(), true);
    }

    /// Press, one iteration, release, one iteration.
    pub fn tap(&mut self, button: ButtonAction) {
        self.press(button);
        self.run_once();
        self.release(button);
        self.run_once();
    }

    pub fn fire(&self, line: ControlLine) {
        line.dispatch(&self.board.state);
    }

    pub fn red_lit(&self) -> bool {
        self.board.pins.level(RED_LED)
    }

    pub fn yellow_lit(&self) -> bool {
        self.board.pins.level(YELLOW_LED)
    }

    pub fn buzzer_on(&self) -> bool {
        self.board.pins.level(BUZZER)
    }

    /// The display currently enabled and the BCD value on the data lines.
    /// `None` if no display, or more than one, is enabled.
    pub fn lit_display(&self) -> Option<(usize, u8)> {
        let pins = &self.board.pins;
        let mut enabled = (0..DISPLAY_COUNT).filter(|&i| pins.level(ENABLE_BASE + i));
        let position = enabled.next()?;
        if enabled.next().is_some() {
            return None;
        }
        let value = (0..DATA_LINES).fold(0u8, |acc, bit| {
            acc | (pins.level(DATA_BASE + bit) as u8) << bit
        });
        Some((position, value))
    }

    pub fn state(&self) -> &'a SharedState {
        self.controller.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEvent;
    use crate::state::Mode;
    use crate::time::Time;

    fn t(h: u8, m: u8, s: u8) -> Time {
        Time::new(h, m, s).unwrap()
    }

    #[test]
    fn sixty_one_ticks_from_zero() {
        let board = SimBoard::new(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.run_ticks(61);

        assert_eq!(sim.state().time(), t(0, 1, 1));
        assert!(sim.red_lit());
        assert!(!sim.yellow_lit());
        assert_eq!(board.clock().now_ms() / 1000, 61);
    }

    #[test]
    fn countdown_scenario_with_alarm() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        for _ in 0..2 {
            sim.tap(ButtonAction::SecondsUp);
        }
        sim.tap(ButtonAction::ToggleMode);
        assert_eq!(sim.state().mode(), Mode::Countdown);

        assert_eq!(sim.tick().event, Some(EngineEvent::Retreated(t(0, 0, 1))));
        assert_eq!(sim.tick().event, Some(EngineEvent::AlarmStarted));
        assert!(sim.buzzer_on());
        assert!(sim.state().is_paused());
        assert_eq!(sim.state().digits().0, [0; 6]);

        for _ in 0..4 {
            sim.tick();
            assert!(sim.buzzer_on());
        }
        assert_eq!(sim.tick().event, Some(EngineEvent::AlarmRetired));
        assert!(!sim.buzzer_on());
        assert_eq!(sim.state().mode(), Mode::Increment);
        assert!(!sim.state().is_paused());
        assert_eq!(sim.state().time(), Time::ZERO);
    }

    #[test]
    fn exactly_one_display_lit_after_every_iteration() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.state().update_time(|time| *time = t(9, 8, 7));

        let mut seen = [None; DISPLAY_COUNT];
        for _ in 0..DISPLAY_COUNT {
            let report = sim.run_once();
            let (position, value) = sim.lit_display().unwrap();
            assert_eq!(position, report.refreshed);
            seen[position] = Some(value);
        }
        assert_eq!(seen, [0, 9, 0, 8, 0, 7].map(Some));
    }

    #[test]
    fn holding_a_button_for_a_thousand_polls() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.press(ButtonAction::HoursUp);
        let applied: usize = (0..1000).map(|_| sim.run_once().actions.len()).sum();
        assert_eq!(applied, 1);
        assert_eq!(sim.state().time(), t(1, 0, 0));
    }

    #[test]
    fn buttons_adjust_during_alarm_and_pause() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.tap(ButtonAction::ToggleMode);
        assert_eq!(sim.tick().event, Some(EngineEvent::AlarmStarted));

        sim.tap(ButtonAction::MinutesUp);
        assert_eq!(sim.state().time(), t(0, 1, 0));
        // the alarm's pause holds the time
        sim.tick();
        assert_eq!(sim.state().time(), t(0, 1, 0));

        // resume lets the countdown run under the buzzer
        sim.fire(ControlLine::Resume);
        assert_eq!(sim.tick().event, Some(EngineEvent::Retreated(t(0, 0, 59))));
        assert!(sim.buzzer_on());
        assert!(sim.yellow_lit());
    }

    #[test]
    fn reset_during_alarm_counts_up_while_buzzer_finishes() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.tap(ButtonAction::ToggleMode);
        assert_eq!(sim.tick().event, Some(EngineEvent::AlarmStarted));

        sim.fire(ControlLine::Reset);
        sim.tick();
        sim.tick();

        let snap = sim.state().snapshot();
        assert_eq!(snap.time, t(0, 0, 2));
        assert_eq!(snap.mode, Mode::Increment);
        assert!(!snap.paused);
        assert!(snap.alarm_active);
        assert!(sim.buzzer_on());
        assert!(sim.red_lit());
    }

    #[test]
    fn reset_overrides_everything() {
        let board = SimBoard::manual(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.tap(ButtonAction::HoursUp);
        sim.tap(ButtonAction::ToggleMode);
        sim.fire(ControlLine::Pause);

        sim.fire(ControlLine::Reset);
        sim.run_once();

        let snap = sim.state().snapshot();
        assert_eq!(snap.time, Time::ZERO);
        assert_eq!(snap.mode, Mode::Increment);
        assert!(!snap.paused);
    }

    #[test]
    fn pause_and_resume_between_ticks_do_not_move_time() {
        let board = SimBoard::new(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.run_ticks(3);
        sim.fire(ControlLine::Pause);
        sim.fire(ControlLine::Resume);
        assert_eq!(sim.state().time(), t(0, 0, 3));

        sim.fire(ControlLine::Pause);
        sim.run_ticks(2);
        assert_eq!(sim.state().time(), t(0, 0, 3));
        assert!(sim.red_lit());

        sim.fire(ControlLine::Resume);
        sim.run_ticks(1);
        assert_eq!(sim.state().time(), t(0, 0, 4));
    }

    #[test]
    fn tick_is_consumed_within_one_hold() {
        let board = SimBoard::new(StopwatchConfig::default());
        let mut sim = board.simulator();
        sim.run_for_ms(998);
        assert_eq!(board.clock().ticks(), 0);

        sim.run_for_ms(2);
        assert_eq!(board.clock().ticks(), 1);
        // the tick arrived during the last hold; the next iteration takes it
        assert!(sim.state().tick_pending());
        assert_eq!(
            sim.run_once().event,
            Some(EngineEvent::Advanced(t(0, 0, 1)))
        );
        assert_eq!(sim.state().time(), t(0, 0, 1));
    }

    #[test]
    fn stalled_loop_loses_ticks() {
        let board = SimBoard::new(StopwatchConfig::default().with_refresh_hold_us(2_500_000));
        let mut sim = board.simulator();
        // each hold spans two and a half tick periods
        sim.run_once();
        sim.run_once();
        sim.run_once();
        assert_eq!(board.clock().ticks(), 7);
        assert_eq!(sim.state().time(), t(0, 0, 2));
    }
}
