/// Number of multiplexed 7-segment displays (HH:MM:SS).
pub const DISPLAY_COUNT: usize = 6;

/// Timing constants shared by the main loop and the interrupt-context tasks.
///
/// Everything is fixed at build time; there is no runtime configuration and
/// nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StopwatchConfig {
    /// Period of the tick source in milliseconds (nominally 1 Hz).
    pub tick_period_ms: u32,
    /// How long each display stays lit per multiplex step, in microseconds.
    pub refresh_hold_us: u32,
    /// Number of ticks the buzzer sounds once a countdown reaches zero.
    pub alarm_duration_ticks: u8,
}

impl StopwatchConfig {
    pub const fn new() -> Self {
        Self {
            tick_period_ms: 1000,
            refresh_hold_us: 2000,
            alarm_duration_ticks: 5,
        }
    }

    pub const fn with_tick_period_ms(mut self, ms: u32) -> Self {
        self.tick_period_ms = if ms == 0 { 1 } else { ms };
        self
    }

    pub const fn with_refresh_hold_us(mut self, us: u32) -> Self {
        self.refresh_hold_us = us;
        self
    }

    pub const fn with_alarm_duration_ticks(mut self, ticks: u8) -> Self {
        self.alarm_duration_ticks = if ticks == 0 { 1 } else { ticks };
        self
    }

    /// Worst-case time for one full pass over all displays.
    pub const fn frame_period_us(&self) -> u32 {
        self.refresh_hold_us * DISPLAY_COUNT as u32
    }
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board_timing() {
        let config = StopwatchConfig::default();
        assert_eq!(config.tick_period_ms, 1000);
        assert_eq!(config.refresh_hold_us, 2000);
        assert_eq!(config.alarm_duration_ticks, 5);
        assert_eq!(config.frame_period_us(), 12_000);
    }

    #[test]
    fn setters_clamp_zero() {
        let config = StopwatchConfig::new()
            .with_tick_period_ms(0)
            .with_alarm_duration_ticks(0);
        assert_eq!(config.tick_period_ms, 1);
        assert_eq!(config.alarm_duration_ticks, 1);
    }
}
