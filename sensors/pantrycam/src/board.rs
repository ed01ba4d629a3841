/// Board timing for the framework: boot clock and task delay
use capture_framework::{Clock, Delay};
use esp_idf_hal::delay::FreeRtos;

/// Milliseconds since boot from the high resolution timer
#[derive(Debug, Clone, Copy, Default)]
pub struct BootClock;

impl Clock for BootClock {
    fn now_ms(&self) -> u32 {
        // Truncation is fine, every consumer compares with wrapping math
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
    }
}

/// Task delay; yields to other FreeRTOS tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct RtosDelay;

impl Delay for RtosDelay {
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}
