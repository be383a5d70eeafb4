//! STM32F103 Blue Pill Stopwatch / Countdown Timer
//! =============================================================================================
//!
//! Six multiplexed 7-segment displays (HH:MM:SS), two mode LEDs, a buzzer,
//! seven polled adjustment buttons and three edge-triggered control buttons.
//!
//! Hardware Connections:
//!   Display enables (active high, one per digit, via transistors)
//!      H-tens PA0, H-units PA1, M-tens PA2, M-units PA3, S-tens PA4, S-units PA5
//!
//!   BCD data -> CD4511 decoder (A, B, C, D)
//!      PA6, PA7, PB0, PB1
//!
//!   Indicators
//!      RED LED (counting up)      -> PB12
//!      YELLOW LED (counting down) -> PB13
//!      Buzzer                     -> PB14
//!      Heartbeat (on-board)       -> PC13
//!
//!   Polled buttons (to GND, internal pull-up)
//!      Mode PB5, H+ PB6, H- PB7, M+ PB8, M- PB9, S+ PB10, S- PB11
//!
//!   Control buttons (EXTI)
//!      Reset  -> PA8  (to GND, internal pull-up, falling edge)
//!      Pause  -> PA9  (external pull-up, rising edge)
//!      Resume -> PA10 (to GND, internal pull-up, falling edge)
//!
//! Execution model:
//! - The tick source and the control lines run as tasks on an interrupt
//!   executor (USART3 is unused and serves as its software interrupt), so
//!   they pre-empt the main loop like ISRs.
//! - The main loop never yields: it polls, updates and busy-waits in the
//!   multiplexer on the thread-mode executor.

#![no_std]
#![no_main]

use defmt::{info, unwrap};
use defmt_rtt as _; // Global logger
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Input, Level, Output, Pull, Speed},
    interrupt,
    interrupt::{InterruptExt, Priority},
};
use embassy_time::{Delay, Duration, Ticker};
use panic_probe as _; // Panic handler

use stopwatch::{
    SharedState, StopwatchConfig,
    buttons::ButtonPanel,
    controller::Controller,
    display::Multiplexer,
    engine::Indicators,
    hardware::{GpioButton, GpioBuzzer, GpioLed, Led, Polarity, SevenSegmentBank},
    interrupts::{self, ControlLine},
};

static STATE: SharedState = SharedState::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

const CONFIG: StopwatchConfig = StopwatchConfig::new();

#[interrupt]
unsafe fn USART3() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

/// Main application entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // Initialize peripherals with default configuration
    let p = embassy_stm32::init(Default::default());
    info!("stopwatch booting: {}", CONFIG);

    // High-priority executor standing in for the interrupt handlers
    interrupt::USART3.set_priority(Priority::P6);
    let irq_spawner = EXECUTOR_HIGH.start(interrupt::USART3);

    // Periodic tick source
    unwrap!(irq_spawner.spawn(tick_source(
        &STATE,
        Duration::from_millis(CONFIG.tick_period_ms as u64),
    )));

    // Control lines
    let reset = ExtiInput::new(p.PA8, p.EXTI8, Pull::Up);
    let pause = ExtiInput::new(p.PA9, p.EXTI9, Pull::None);
    let resume = ExtiInput::new(p.PA10, p.EXTI10, Pull::Up);
    unwrap!(irq_spawner.spawn(control_line(reset, ControlLine::Reset, &STATE)));
    unwrap!(irq_spawner.spawn(control_line(pause, ControlLine::Pause, &STATE)));
    unwrap!(irq_spawner.spawn(control_line(resume, ControlLine::Resume, &STATE)));

    // Polled buttons, in evaluation order
    let panel = ButtonPanel::new([
        GpioButton::new(Input::new(p.PB5, Pull::Up)),
        GpioButton::new(Input::new(p.PB6, Pull::Up)),
        GpioButton::new(Input::new(p.PB7, Pull::Up)),
        GpioButton::new(Input::new(p.PB8, Pull::Up)),
        GpioButton::new(Input::new(p.PB9, Pull::Up)),
        GpioButton::new(Input::new(p.PB10, Pull::Up)),
        GpioButton::new(Input::new(p.PB11, Pull::Up)),
    ]);

    let indicators = Indicators::new(
        GpioLed::new(
            Output::new(p.PB12, Level::Low, Speed::Low),
            Polarity::ActiveHigh,
        ),
        GpioLed::new(
            Output::new(p.PB13, Level::Low, Speed::Low),
            Polarity::ActiveHigh,
        ),
        GpioBuzzer::new(Output::new(p.PB14, Level::Low, Speed::Low)),
    );

    let bank = SevenSegmentBank::bcd(
        [
            Output::new(p.PA0, Level::Low, Speed::Medium),
            Output::new(p.PA1, Level::Low, Speed::Medium),
            Output::new(p.PA2, Level::Low, Speed::Medium),
            Output::new(p.PA3, Level::Low, Speed::Medium),
            Output::new(p.PA4, Level::Low, Speed::Medium),
            Output::new(p.PA5, Level::Low, Speed::Medium),
        ],
        [
            Output::new(p.PA6, Level::Low, Speed::Medium),
            Output::new(p.PA7, Level::Low, Speed::Medium),
            Output::new(p.PB0, Level::Low, Speed::Medium),
            Output::new(p.PB1, Level::Low, Speed::Medium),
        ],
    );
    let mux = Multiplexer::new(bank, Delay, &CONFIG);

    // On-board LED (PC13) lit while the main loop runs
    let mut heartbeat = GpioLed::new(
        Output::new(p.PC13, Level::High, Speed::Low),
        Polarity::ActiveLow,
    );
    heartbeat.on();

    let mut controller = Controller::new(&STATE, panel, indicators, mux, &CONFIG);
    controller.run()
}

/// Periodic Tick Task
///
/// Stands in for the compare-match interrupt: one tick per period. A tick
/// that the main loop has not consumed by the next one is overwritten.
#[embassy_executor::task]
async fn tick_source(state: &'static SharedState, period: Duration) {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        interrupts::on_tick(state);
    }
}

/// Control Line Task
///
/// One instance per line: waits for the configured edge and applies the
/// line's handler.
#[embassy_executor::task(pool_size = 3)]
async fn control_line(
    mut pin: ExtiInput<'static>,
    line: ControlLine,
    state: &'static SharedState,
) {
    loop {
        // ExtiInput waits are infallible
        let _ = interrupts::wait_control_line(&mut pin, line, state).await;
        info!("{} pressed", line);
    }
}
