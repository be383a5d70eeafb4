//! Polled push buttons with press-edge detection.
//!
//! There is no time-based debounce: a button fires once when its line first
//! reads pressed and re-arms only after a poll sees it released. The main
//! loop polls every few milliseconds, which is fast enough to see every
//! release.

use heapless::Vec;

use crate::hardware::traits::Button;
use crate::state::SharedState;
use crate::time::Time;

/// Remembers whether the current press has already been actioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    held: bool,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { held: false }
    }

    /// Returns `true` only on the released-to-pressed transition.
    pub fn update(&mut self, active: bool) -> bool {
        match (active, self.held) {
            (true, false) => {
                self.held = true;
                true
            }
            (false, true) => {
                self.held = false;
                false
            }
            _ => false,
        }
    }

    pub const fn is_held(&self) -> bool {
        self.held
    }
}

/// What a polled button does, listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    ToggleMode,
    HoursUp,
    HoursDown,
    MinutesUp,
    MinutesDown,
    SecondsUp,
    SecondsDown,
}

impl ButtonAction {
    pub const COUNT: usize = 7;

    /// When several buttons are down in the same poll their effects are
    /// applied in this order.
    pub const ALL: [ButtonAction; Self::COUNT] = [
        ButtonAction::ToggleMode,
        ButtonAction::HoursUp,
        ButtonAction::HoursDown,
        ButtonAction::MinutesUp,
        ButtonAction::MinutesDown,
        ButtonAction::SecondsUp,
        ButtonAction::SecondsDown,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn apply(self, state: &SharedState) {
        match self {
            ButtonAction::ToggleMode => {
                state.toggle_mode();
            }
            ButtonAction::HoursUp => {
                state.update_time(Time::increment_hours);
            }
            ButtonAction::HoursDown => {
                state.update_time(Time::decrement_hours);
            }
            ButtonAction::MinutesUp => {
                state.update_time(Time::increment_minutes);
            }
            ButtonAction::MinutesDown => {
                state.update_time(Time::decrement_minutes);
            }
            ButtonAction::SecondsUp => {
                state.update_time(Time::increment_seconds);
            }
            ButtonAction::SecondsDown => {
                state.update_time(Time::decrement_seconds);
            }
        }
    }
}

/// The seven polled buttons, indexed by [`ButtonAction::index`].
pub struct ButtonPanel<B> {
    buttons: [B; ButtonAction::COUNT],
    detectors: [EdgeDetector; ButtonAction::COUNT],
}

impl<B: Button> ButtonPanel<B> {
    pub fn new(buttons: [B; ButtonAction::COUNT]) -> Self {
        Self {
            buttons,
            detectors: [EdgeDetector::new(); ButtonAction::COUNT],
        }
    }

    /// Reads every button once and applies the effect of each new press.
    ///
    /// Runs regardless of pause or alarm state, so manual adjustment is
    /// always available.
    pub fn poll(&mut self, state: &SharedState) -> Vec<ButtonAction, { ButtonAction::COUNT }> {
        let mut applied = Vec::new();
        for action in ButtonAction::ALL {
            let i = action.index();
            let pressed = self.buttons[i].is_pressed();
            if self.detectors[i].update(pressed) {
                action.apply(state);
                // capacity equals the number of buttons
                let _ = applied.push(action);
            }
        }
        applied
    }
}
