//! The single state block shared by the main loop and interrupt context.
//!
//! Nothing here takes a lock or masks interrupts. Hours, minutes and seconds
//! share one atomic word, so a carry across all three is a single
//! compare-and-swap: a handler that stores a new time while the main loop is
//! half way through an update makes the update retry on top of it instead of
//! being overwritten. The derived digits can at worst lag one refresh.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::config::DISPLAY_COUNT;
use crate::time::{Digits, Time};

/// Counting direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    #[default]
    Increment = 0,
    Countdown = 1,
}

impl Mode {
    pub const fn toggled(self) -> Self {
        match self {
            Mode::Increment => Mode::Countdown,
            Mode::Countdown => Mode::Increment,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Mode::Increment,
            _ => Mode::Countdown,
        }
    }
}

/// `0x00HHMMSS`.
const fn pack(time: Time) -> u32 {
    ((time.hours() as u32) << 16) | ((time.minutes() as u32) << 8) | time.seconds() as u32
}

fn unpack(bits: u32) -> Time {
    let [_, hours, minutes, seconds] = bits.to_be_bytes();
    // Only ever stored from a valid `Time`.
    Time::new(hours, minutes, seconds).unwrap_or(Time::ZERO)
}

pub struct SharedState {
    time: AtomicU32,
    mode: AtomicU8,
    paused: AtomicBool,
    digits: [AtomicU8; DISPLAY_COUNT],
    current_display: AtomicU8,
    tick_pending: AtomicBool,
    alarm_active: AtomicBool,
    alarm_elapsed: AtomicU8,
}

impl SharedState {
    /// Power-on state: 00:00:00, counting up, running, no alarm.
    pub const fn new() -> Self {
        Self {
            time: AtomicU32::new(0),
            mode: AtomicU8::new(Mode::Increment as u8),
            paused: AtomicBool::new(false),
            digits: [const { AtomicU8::new(0) }; DISPLAY_COUNT],
            current_display: AtomicU8::new(0),
            tick_pending: AtomicBool::new(false),
            alarm_active: AtomicBool::new(false),
            alarm_elapsed: AtomicU8::new(0),
        }
    }

    pub fn time(&self) -> Time {
        unpack(self.time.load(Ordering::Relaxed))
    }

    /// One atomic store of all three fields. Does not touch the display digits.
    pub fn store_time(&self, time: Time) {
        self.time.store(pack(time), Ordering::Relaxed);
    }

    /// Read-modify-write of the time, then re-derives the digits.
    ///
    /// If a handler stores a new time between the read and the write, `f`
    /// runs again on the handler's value.
    pub fn update_time(&self, mut f: impl FnMut(&mut Time)) -> Time {
        let mut updated = Time::ZERO;
        // The closure always returns `Some`, so this cannot fail.
        let _ = self
            .time
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let mut time = unpack(bits);
                f(&mut time);
                updated = time;
                Some(pack(time))
            });
        self.refresh_digits();
        updated
    }

    pub fn mode(&self) -> Mode {
        Mode::from_bits(self.mode.load(Ordering::Relaxed))
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn toggle_mode(&self) -> Mode {
        let mode = self.mode().toggled();
        self.set_mode(mode);
        mode
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Single-slot mailbox: a second post before the consumer takes the
    /// first is lost.
    pub fn post_tick(&self) {
        self.tick_pending.store(true, Ordering::Relaxed);
    }

    pub fn tick_pending(&self) -> bool {
        self.tick_pending.load(Ordering::Relaxed)
    }

    /// Consumes the pending tick, if any.
    pub fn take_tick(&self) -> bool {
        self.tick_pending.swap(false, Ordering::Relaxed)
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm_active.load(Ordering::Relaxed)
    }

    pub fn alarm_elapsed(&self) -> u8 {
        self.alarm_elapsed.load(Ordering::Relaxed)
    }

    pub(crate) fn count_alarm_tick(&self) {
        let elapsed = self.alarm_elapsed.load(Ordering::Relaxed);
        self.alarm_elapsed
            .store(elapsed.saturating_add(1), Ordering::Relaxed);
    }

    pub(crate) fn start_alarm(&self) {
        self.alarm_elapsed.store(0, Ordering::Relaxed);
        self.alarm_active.store(true, Ordering::Relaxed);
    }

    pub(crate) fn retire_alarm(&self) {
        self.alarm_active.store(false, Ordering::Relaxed);
        self.alarm_elapsed.store(0, Ordering::Relaxed);
    }

    /// Re-derives the display digits from the current time fields.
    pub fn refresh_digits(&self) {
        for (slot, digit) in self.digits.iter().zip(self.time().split().iter()) {
            slot.store(digit, Ordering::Relaxed);
        }
    }

    pub fn digits(&self) -> Digits {
        let mut out = [0; DISPLAY_COUNT];
        for (dst, slot) in out.iter_mut().zip(self.digits.iter()) {
            *dst = slot.load(Ordering::Relaxed);
        }
        Digits(out)
    }

    pub fn digit(&self, position: usize) -> u8 {
        self.digits[position % DISPLAY_COUNT].load(Ordering::Relaxed)
    }

    pub fn current_display(&self) -> usize {
        self.current_display.load(Ordering::Relaxed) as usize % DISPLAY_COUNT
    }

    /// Moves the refresh pointer to the next display and returns it.
    pub fn advance_display(&self) -> usize {
        let next = (self.current_display() + 1) % DISPLAY_COUNT;
        self.current_display.store(next as u8, Ordering::Relaxed);
        next
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            time: self.time(),
            mode: self.mode(),
            paused: self.is_paused(),
            alarm_active: self.alarm_active(),
            alarm_elapsed: self.alarm_elapsed(),
            tick_pending: self.tick_pending(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the canonical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateSnapshot {
    pub time: Time,
    pub mode: Mode,
    pub paused: bool,
    pub alarm_active: bool,
    pub alarm_elapsed: u8,
    pub tick_pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let state = SharedState::new();
        let snap = state.snapshot();
        assert_eq!(snap.time, Time::ZERO);
        assert_eq!(snap.mode, Mode::Increment);
        assert!(!snap.paused);
        assert!(!snap.alarm_active);
        assert!(!snap.tick_pending);
        assert_eq!(state.digits(), Digits([0; 6]));
        assert_eq!(state.current_display(), 0);
    }

    #[test]
    fn tick_mailbox_holds_one_tick() {
        let state = SharedState::new();
        state.post_tick();
        state.post_tick();
        assert!(state.take_tick());
        assert!(!state.take_tick());
    }

    #[test]
    fn update_time_rederives_digits() {
        let state = SharedState::new();
        state.store_time(Time::new(0, 59, 59).unwrap());
        assert_eq!(state.digits(), Digits([0; 6]));

        let time = state.update_time(Time::advance);
        assert_eq!(time, Time::new(1, 0, 0).unwrap());
        assert_eq!(state.digits(), Digits([0, 1, 0, 0, 0, 0]));
    }

    #[test]
    fn time_packs_into_one_word() {
        let state = SharedState::new();
        state.store_time(Time::new(23, 59, 58).unwrap());
        assert_eq!(state.time.load(Ordering::Relaxed), 0x0017_3B3A);
        assert_eq!(state.time(), Time::new(23, 59, 58).unwrap());
    }

    #[test]
    fn store_during_update_is_not_overwritten() {
        let state = SharedState::new();
        state.store_time(Time::new(12, 34, 56).unwrap());

        // a handler lands between the read and the write of the first attempt
        let mut attempts = 0;
        let time = state.update_time(|time| {
            attempts += 1;
            if attempts == 1 {
                state.store_time(Time::ZERO);
            }
            time.advance();
        });

        assert_eq!(attempts, 2);
        assert_eq!(time, Time::new(0, 0, 1).unwrap());
        assert_eq!(state.time(), Time::new(0, 0, 1).unwrap());
        assert_eq!(state.digits(), Digits([0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn display_pointer_cycles_through_six() {
        let state = SharedState::new();
        let visited: Vec<usize> = (0..7).map(|_| state.advance_display()).collect();
        assert_eq!(visited, [1, 2, 3, 4, 5, 0, 1]);
    }

    #[test]
    fn toggle_mode_flips() {
        let state = SharedState::new();
        assert_eq!(state.toggle_mode(), Mode::Countdown);
        assert_eq!(state.toggle_mode(), Mode::Increment);
    }

    #[test]
    fn alarm_counter_saturates() {
        let state = SharedState::new();
        state.start_alarm();
        for _ in 0..300 {
            state.count_alarm_tick();
        }
        assert_eq!(state.alarm_elapsed(), u8::MAX);
        state.retire_alarm();
        assert_eq!(state.alarm_elapsed(), 0);
        assert!(!state.alarm_active());
    }
}
