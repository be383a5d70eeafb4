//! Six common-cathode 7-segment displays multiplexed over shared data lines.
//!
//! Each display's common line is switched by its own enable output (active
//! high, usually through a transistor). The data lines carry four BCD bits
//! into an external decoder such as a CD4511; [`SevenSegmentBank::new`] takes
//! any other digit encoding for wider data buses.

use super::traits::SegmentDisplay;
use crate::config::DISPLAY_COUNT;
use embedded_hal::digital::OutputPin;

/// Digit-to-data-line encodings. Bit `i` of the result drives data line `i`.
pub mod encoding {
    /// Four-bit BCD for an external decoder.
    pub fn bcd(digit: u8) -> u8 {
        digit & 0x0F
    }
}

pub struct SevenSegmentBank<EN, DATA, const N: usize> {
    enables: [EN; DISPLAY_COUNT],
    data: [DATA; N],
    encode: fn(u8) -> u8,
}

impl<EN, DATA> SevenSegmentBank<EN, DATA, 4>
where
    EN: OutputPin,
    DATA: OutputPin,
{
    /// Four BCD lines, least significant bit first.
    pub fn bcd(enables: [EN; DISPLAY_COUNT], data: [DATA; 4]) -> Self {
        Self::new(enables, data, encoding::bcd)
    }
}

impl<EN, DATA, const N: usize> SevenSegmentBank<EN, DATA, N>
where
    EN: OutputPin,
    DATA: OutputPin,
{
    pub fn new(enables: [EN; DISPLAY_COUNT], data: [DATA; N], encode: fn(u8) -> u8) -> Self {
        let mut bank = Self {
            enables,
            data,
            encode,
        };
        bank.blank_all();
        bank
    }
}

impl<EN, DATA, const N: usize> SegmentDisplay for SevenSegmentBank<EN, DATA, N>
where
    EN: OutputPin,
    DATA: OutputPin,
{
    fn blank_all(&mut self) {
        for enable in self.enables.iter_mut() {
            let _ = enable.set_low();
        }
    }

    fn show(&mut self, position: usize, digit: u8) {
        let pattern = (self.encode)(digit);
        for (bit, line) in self.data.iter_mut().enumerate() {
            let _ = line.set_state(((pattern >> bit) & 1 == 1).into());
        }
        let _ = self.enables[position % DISPLAY_COUNT].set_high();
    }
}
