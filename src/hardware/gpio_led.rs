use super::traits::{Buzzer, Led};
use embedded_hal::digital::{OutputPin, StatefulOutputPin};

/// Which line level lights the LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Anode on the pin (indicator LEDs, buzzer driver).
    ActiveHigh,
    /// Cathode on the pin, e.g. the Blue Pill's PC13 LED.
    ActiveLow,
}

pub struct GpioLed<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> GpioLed<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    fn drive(&mut self, lit: bool) {
        let high = match self.polarity {
            Polarity::ActiveHigh => lit,
            Polarity::ActiveLow => !lit,
        };
        let _ = self.pin.set_state(high.into());
    }
}

impl<P: StatefulOutputPin> Led for GpioLed<P> {
    fn on(&mut self) {
        self.drive(true);
    }

    fn off(&mut self) {
        self.drive(false);
    }

    fn toggle(&mut self) {
        let _ = self.pin.toggle();
    }
}

/// Active-high buzzer driver (transistor or self-oscillating piezo).
pub struct GpioBuzzer<P> {
    pin: P,
}

impl<P: OutputPin> GpioBuzzer<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> Buzzer for GpioBuzzer<P> {
    fn start(&mut self) {
        let _ = self.pin.set_high();
    }

    fn stop(&mut self) {
        let _ = self.pin.set_low();
    }
}
