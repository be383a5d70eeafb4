use core::fmt;

use crate::config::DISPLAY_COUNT;

const HOURS_PER_DAY: u8 = 24;
const MINUTES_PER_HOUR: u8 = 60;
const SECONDS_PER_MINUTE: u8 = 60;

/// Hours, minutes and seconds held by the stopwatch.
///
/// Every mutation wraps within its field's base and carries into (or borrows
/// from) the next larger field, so a `Time` is never out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Time {
    pub const ZERO: Time = Time {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Returns `None` if any field is out of range.
    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        if hours >= HOURS_PER_DAY || minutes >= MINUTES_PER_HOUR || seconds >= SECONDS_PER_MINUTE {
            return None;
        }
        Some(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub const fn hours(&self) -> u8 {
        self.hours
    }

    pub const fn minutes(&self) -> u8 {
        self.minutes
    }

    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    pub const fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    pub fn reset(&mut self) {
        *self = Self::ZERO;
    }

    /// Moves forward by one second.
    pub fn advance(&mut self) {
        self.increment_seconds();
    }

    /// Moves back by one second, wrapping 00:00:00 to 23:59:59.
    pub fn retreat(&mut self) {
        self.decrement_seconds();
    }

    pub fn increment_hours(&mut self) {
        self.hours = (self.hours + 1) % HOURS_PER_DAY;
    }

    pub fn decrement_hours(&mut self) {
        self.hours = match self.hours {
            0 => HOURS_PER_DAY - 1,
            h => h - 1,
        };
    }

    pub fn increment_minutes(&mut self) {
        self.minutes += 1;
        if self.minutes >= MINUTES_PER_HOUR {
            self.minutes = 0;
            self.increment_hours();
        }
    }

    pub fn decrement_minutes(&mut self) {
        if self.minutes == 0 {
            self.minutes = MINUTES_PER_HOUR - 1;
            self.decrement_hours();
        } else {
            self.minutes -= 1;
        }
    }

    pub fn increment_seconds(&mut self) {
        self.seconds += 1;
        if self.seconds >= SECONDS_PER_MINUTE {
            self.seconds = 0;
            self.increment_minutes();
        }
    }

    pub fn decrement_seconds(&mut self) {
        if self.seconds == 0 {
            self.seconds = SECONDS_PER_MINUTE - 1;
            self.decrement_minutes();
        } else {
            self.seconds -= 1;
        }
    }

    /// Splits into the six display digits, most significant first.
    pub const fn split(&self) -> Digits {
        Digits([
            self.hours / 10,
            self.hours % 10,
            self.minutes / 10,
            self.minutes % 10,
            self.seconds / 10,
            self.seconds % 10,
        ])
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Display digits ordered `[H-tens, H-units, M-tens, M-units, S-tens, S-units]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Digits(pub [u8; DISPLAY_COUNT]);

impl Digits {
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}
