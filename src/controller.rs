use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::buttons::{ButtonAction, ButtonPanel};
use crate::config::StopwatchConfig;
use crate::display::Multiplexer;
use crate::engine::{EngineEvent, Indicators, TimeEngine};
use crate::hardware::traits::{Button, Buzzer, Led, SegmentDisplay};
use crate::state::SharedState;

/// What one main-loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub actions: Vec<ButtonAction, { ButtonAction::COUNT }>,
    pub event: Option<EngineEvent>,
    pub refreshed: usize,
}

/// The main loop: buttons, then time, then one display.
pub struct Controller<'a, B, R, Y, Z, D, T> {
    state: &'a SharedState,
    panel: ButtonPanel<B>,
    engine: TimeEngine,
    indicators: Indicators<R, Y, Z>,
    mux: Multiplexer<D, T>,
}

impl<'a, B, R, Y, Z, D, T> Controller<'a, B, R, Y, Z, D, T>
where
    B: Button,
    R: Led,
    Y: Led,
    Z: Buzzer,
    D: SegmentDisplay,
    T: DelayNs,
{
    pub fn new(
        state: &'a SharedState,
        panel: ButtonPanel<B>,
        indicators: Indicators<R, Y, Z>,
        mux: Multiplexer<D, T>,
        config: &StopwatchConfig,
    ) -> Self {
        state.refresh_digits();
        debug!(
            "hold {} us per display, {} us per frame",
            config.refresh_hold_us,
            config.frame_period_us()
        );
        Self {
            state,
            panel,
            engine: TimeEngine::new(config),
            indicators,
            mux,
        }
    }

    pub fn run_once(&mut self) -> LoopReport {
        let actions = self.panel.poll(self.state);
        for action in actions.iter() {
            debug!("button {} -> {}", action, self.state.time());
        }

        let event = self.engine.update(self.state, &mut self.indicators);
        let refreshed = self.mux.refresh(self.state);

        LoopReport {
            actions,
            event,
            refreshed,
        }
    }

    pub fn run(&mut self) -> ! {
        info!("stopwatch running at {}", self.state.time());
        loop {
            self.run_once();
        }
    }

    pub fn state(&self) -> &'a SharedState {
        self.state
    }
}
