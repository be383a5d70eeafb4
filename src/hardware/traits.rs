pub trait Led {
    fn on(&mut self);
    fn off(&mut self);
    fn toggle(&mut self);

    fn set(&mut self, lit: bool) {
        if lit {
            self.on()
        } else {
            self.off()
        }
    }
}

pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

pub trait Buzzer {
    fn start(&mut self);
    fn stop(&mut self);
}

/// A bank of multiplexed digit displays sharing one set of data lines.
pub trait SegmentDisplay {
    /// Disables every display.
    fn blank_all(&mut self);

    /// Drives `digit` onto the data lines and enables only `position`.
    fn show(&mut self, position: usize, digit: u8);
}
