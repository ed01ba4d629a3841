//! Millisecond timing helpers shared by every rate-limited component
//!
//! Timestamps are `u32` milliseconds since boot, like the ESP-IDF timer
//! truncated to 32 bits. Differences use wrapping arithmetic so the ~49 day
//! rollover does not stall any schedule.

/// Milliseconds elapsed from `since` to `now`, rollover safe
pub fn elapsed_ms(now_ms: u32, since_ms: u32) -> u32 {
    now_ms.wrapping_sub(since_ms)
}

/// True if more than `period_ms` has passed since `last_ms`, or if nothing
/// has happened yet
pub fn period_elapsed(now_ms: u32, last_ms: Option<u32>, period_ms: u32) -> bool {
    match last_ms {
        Some(last) => elapsed_ms(now_ms, last) > period_ms,
        None => true,
    }
}

/// Blocking delay used for probe spacing, settle pauses and loop yields
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

/// Millisecond clock since boot
pub trait Clock {
    fn now_ms(&self) -> u32;
}
