use embedded_hal::delay::DelayNs;

use crate::config::StopwatchConfig;
use crate::hardware::traits::SegmentDisplay;
use crate::state::SharedState;

/// Lights one display per call and holds it for persistence of vision.
///
/// The hold is a blocking delay; it is where the main loop spends nearly all
/// its time, so it bounds how quickly buttons and ticks are noticed
/// (one full frame is six holds).
pub struct Multiplexer<D, T> {
    display: D,
    delay: T,
    hold_us: u32,
}

impl<D: SegmentDisplay, T: DelayNs> Multiplexer<D, T> {
    pub fn new(display: D, delay: T, config: &StopwatchConfig) -> Self {
        Self {
            display,
            delay,
            hold_us: config.refresh_hold_us,
        }
    }

    /// One multiplex step. Returns the position that was lit.
    pub fn refresh(&mut self, state: &SharedState) -> usize {
        let position = state.current_display();
        self.display.blank_all();
        self.display.show(position, state.digit(position));
        self.delay.delay_us(self.hold_us);
        state.advance_display();
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(usize, u8)>,
        lit: Option<usize>,
        blanks: usize,
    }

    impl SegmentDisplay for Recorder {
        fn blank_all(&mut self) {
            self.lit = None;
            self.blanks += 1;
        }

        fn show(&mut self, position: usize, digit: u8) {
            assert!(self.lit.is_none(), "two displays enabled at once");
            self.lit = Some(position);
            self.frames.push((position, digit));
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn cycles_all_six_positions_in_order() {
        let state = SharedState::new();
        state.update_time(|t| *t = Time::new(12, 34, 56).unwrap());

        let mut mux = Multiplexer::new(
            Recorder::default(),
            CountingDelay::default(),
            &StopwatchConfig::default(),
        );
        let lit: Vec<usize> = (0..12).map(|_| mux.refresh(&state)).collect();

        assert_eq!(lit, [0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5]);
        assert_eq!(
            &mux.display.frames[..6],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6)]
        );
        assert_eq!(mux.display.blanks, 12);
        // 12 holds of 2 ms
        assert_eq!(mux.delay.total_ns, 24_000_000);
    }

    #[test]
    fn picks_up_time_changes_on_next_step() {
        let state = SharedState::new();

        let mut mux = Multiplexer::new(
            Recorder::default(),
            CountingDelay::default(),
            &StopwatchConfig::default(),
        );
        for _ in 0..5 {
            mux.refresh(&state);
        }
        state.update_time(|t| *t = Time::new(0, 0, 7).unwrap());
        mux.refresh(&state);

        assert_eq!(mux.display.frames.last(), Some(&(5, 7)));
    }
}
