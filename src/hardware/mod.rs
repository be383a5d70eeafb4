pub mod gpio_button;
pub mod gpio_led;
pub mod seven_segment;
pub mod traits;

pub use gpio_button::GpioButton;
pub use gpio_led::{GpioBuzzer, GpioLed, Polarity};
pub use seven_segment::SevenSegmentBank;
pub use traits::{Button, Buzzer, Led, SegmentDisplay};
