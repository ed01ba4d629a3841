//! HC-SR04 Ultrasonic Ranger Driver
//!
//! Pure Rust echo-timing logic for HC-SR04 class ultrasonic sensors. The
//! hardware side (GPIO lines and a microsecond clock) is supplied through the
//! [`EchoPins`] trait, so the same code runs on the ESP32 and in host tests.
//!
//! # Features
//!
//! - Trigger pulse generation (2 µs low, 10 µs high)
//! - `pulseIn`-style echo measurement with a single overall timeout
//! - Time-of-flight to centimeter conversion
//! - Out-of-band readings rejected, never clamped
//! - `no_std` compatible
//!
//! # Example
//!
//! ```ignore
//! use hcsr04::{ping, DEFAULT_ECHO_TIMEOUT_US};
//!
//! match ping(&mut pins, DEFAULT_ECHO_TIMEOUT_US) {
//!     Ok(cm) => println!("Distance: {:.1} cm", cm),
//!     Err(e) => println!("No echo: {:?}", e),
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "logging")]
use log::debug;

/// Round-trip echo time per centimeter at ~20 °C (µs/cm)
pub const US_PER_CM: f32 = 58.0;

/// Echo timeout covering the full 400 cm range plus margin
pub const DEFAULT_ECHO_TIMEOUT_US: u32 = 30_000;

/// Trigger line low time before the pulse
const TRIGGER_SETTLE_US: u32 = 2;

/// Trigger pulse width required by the sensor
const TRIGGER_PULSE_US: u32 = 10;

/// Echo measurement errors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EchoError {
    /// No complete echo pulse within the timeout
    Timeout,
    /// Echo decoded to a distance outside the valid band (cm)
    OutOfRange(f32),
}

/// Valid measurement band, exclusive lower bound, inclusive upper bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBand {
    pub min_cm: f32,
    pub max_cm: f32,
}

impl RangeBand {
    pub const fn new(min_cm: f32, max_cm: f32) -> Self {
        Self { min_cm, max_cm }
    }

    /// True when `cm` lies in `(min_cm, max_cm]`
    pub fn contains(&self, cm: f32) -> bool {
        cm > self.min_cm && cm <= self.max_cm
    }
}

impl Default for RangeBand {
    fn default() -> Self {
        Self::new(2.0, 400.0)
    }
}

/// Hardware access needed for one ranging cycle
pub trait EchoPins {
    /// Drive the trigger line
    fn set_trigger(&mut self, high: bool);

    /// Sample the echo line
    fn echo_is_high(&mut self) -> bool;

    /// Monotonic microsecond clock
    fn now_us(&mut self) -> u64;

    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u32);
}

/// Convert an echo pulse width to centimeters
///
/// A zero-length pulse is how `pulseIn` style APIs report a timeout, so it
/// maps to [`EchoError::Timeout`].
pub fn echo_to_cm(duration_us: u32, band: RangeBand) -> Result<f32, EchoError> {
    if duration_us == 0 {
        return Err(EchoError::Timeout);
    }

    let cm = duration_us as f32 / US_PER_CM;
    if !band.contains(cm) {
        return Err(EchoError::OutOfRange(cm));
    }
    Ok(cm)
}

/// Fire the trigger line and measure the width of the echo pulse
///
/// Mirrors Arduino `pulseIn(pin, HIGH, timeout)`: waits for any pulse already
/// in progress to end, waits for the rising edge, then times the high period.
/// The timeout bounds the whole measurement, not each phase.
pub fn measure_echo_us<P: EchoPins>(pins: &mut P, timeout_us: u32) -> Result<u32, EchoError> {
    pins.set_trigger(false);
    pins.delay_us(TRIGGER_SETTLE_US);
    pins.set_trigger(true);
    pins.delay_us(TRIGGER_PULSE_US);
    pins.set_trigger(false);

    let start = pins.now_us();
    let deadline = start + timeout_us as u64;

    // Previous pulse still high
    while pins.echo_is_high() {
        if pins.now_us() >= deadline {
            return Err(EchoError::Timeout);
        }
    }

    while !pins.echo_is_high() {
        if pins.now_us() >= deadline {
            return Err(EchoError::Timeout);
        }
    }
    let rise = pins.now_us();

    while pins.echo_is_high() {
        if pins.now_us() >= deadline {
            return Err(EchoError::Timeout);
        }
    }
    let fall = pins.now_us();

    Ok((fall - rise) as u32)
}

/// Run one complete ranging cycle and return the distance in centimeters
pub fn ping<P: EchoPins>(pins: &mut P, timeout_us: u32) -> Result<f32, EchoError> {
    ping_in_band(pins, timeout_us, RangeBand::default())
}

/// Like [`ping`] with a caller supplied validity band
pub fn ping_in_band<P: EchoPins>(
    pins: &mut P,
    timeout_us: u32,
    band: RangeBand,
) -> Result<f32, EchoError> {
    let result = measure_echo_us(pins, timeout_us).and_then(|us| echo_to_cm(us, band));

    #[cfg(feature = "logging")]
    if let Err(e) = result {
        debug!("HC-SR04 probe rejected: {:?}", e);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulated sensor: time advances 1 µs per clock read or echo sample
    struct SimPins {
        t_us: u64,
        trigger_fall_us: Option<u64>,
        echo_delay_us: u64,
        echo_width_us: Option<u64>,
    }

    impl SimPins {
        fn with_echo(delay_us: u64, width_us: u64) -> Self {
            Self {
                t_us: 0,
                trigger_fall_us: None,
                echo_delay_us: delay_us,
                echo_width_us: Some(width_us),
            }
        }

        fn silent() -> Self {
            Self {
                t_us: 0,
                trigger_fall_us: None,
                echo_delay_us: 0,
                echo_width_us: None,
            }
        }
    }

    impl EchoPins for SimPins {
        fn set_trigger(&mut self, high: bool) {
            if !high && self.t_us > 0 {
                self.trigger_fall_us = Some(self.t_us);
            }
        }

        fn echo_is_high(&mut self) -> bool {
            self.t_us += 1;
            match (self.trigger_fall_us, self.echo_width_us) {
                (Some(fall), Some(width)) => {
                    let rise = fall + self.echo_delay_us;
                    self.t_us >= rise && self.t_us < rise + width
                }
                _ => false,
            }
        }

        fn now_us(&mut self) -> u64 {
            self.t_us
        }

        fn delay_us(&mut self, us: u32) {
            self.t_us += us as u64;
        }
    }

    #[test]
    fn test_echo_conversion() {
        let band = RangeBand::default();
        assert_eq!(echo_to_cm(580, band), Ok(10.0));
        assert_eq!(echo_to_cm(5800, band), Ok(100.0));
    }

    #[test]
    fn test_zero_pulse_is_timeout() {
        assert_eq!(echo_to_cm(0, RangeBand::default()), Err(EchoError::Timeout));
    }

    #[test]
    fn test_out_of_band_rejected() {
        let band = RangeBand::default();
        // 1 cm: too close
        assert!(matches!(echo_to_cm(58, band), Err(EchoError::OutOfRange(_))));
        // 2.0 cm sits on the exclusive lower bound
        assert!(matches!(echo_to_cm(116, band), Err(EchoError::OutOfRange(_))));
        // 500 cm: beyond the sensor's range
        assert!(matches!(echo_to_cm(29_000, band), Err(EchoError::OutOfRange(_))));
        // 400 cm is still valid
        assert_eq!(echo_to_cm(23_200, band), Ok(400.0));
    }

    #[test]
    fn test_ping_measures_pulse_width() {
        let mut pins = SimPins::with_echo(200, 1160);
        let cm = ping(&mut pins, DEFAULT_ECHO_TIMEOUT_US).unwrap();
        assert!((cm - 20.0).abs() < 0.1, "got {}", cm);
    }

    #[test]
    fn test_ping_times_out_without_echo() {
        let mut pins = SimPins::silent();
        assert_eq!(
            ping(&mut pins, DEFAULT_ECHO_TIMEOUT_US),
            Err(EchoError::Timeout)
        );
        // Gave up at the deadline instead of spinning forever
        assert!(pins.t_us <= DEFAULT_ECHO_TIMEOUT_US as u64 + 20);
    }

    #[test]
    fn test_ping_times_out_on_endless_pulse() {
        let mut pins = SimPins::with_echo(100, 1_000_000);
        assert_eq!(ping(&mut pins, 5_000), Err(EchoError::Timeout));
    }

    #[test]
    fn test_custom_band() {
        let mut pins = SimPins::with_echo(50, 5800);
        let band = RangeBand::new(2.0, 50.0);
        assert!(matches!(
            ping_in_band(&mut pins, DEFAULT_ECHO_TIMEOUT_US, band),
            Err(EchoError::OutOfRange(_))
        ));
    }
}
