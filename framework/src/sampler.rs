//! Distance sampler
//!
//! Reduces a burst of raw ultrasonic probes to one de-noised distance per poll
//! cycle. Probes that time out or land outside the valid band are dropped
//! rather than clamped; the survivors are reduced with a median, which rejects
//! single-probe echo/multipath outliers without smearing a genuine step change
//! the way a mean would.
//!
//! The sampler is stateless between calls. Rate limiting is the caller's job
//! (see [`crate::scheduler::SchedulerConfig::poll_period_ms`]).

use log::debug;

use crate::error::SensorFault;
use crate::timing::Delay;

/// One de-noised reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceSample {
    /// Distance in centimeters, inside the sampler's band
    Valid(f32),
    /// Every probe failed
    Invalid,
}

impl DistanceSample {
    /// Distance in cm, `None` for an invalid sample
    pub fn cm(self) -> Option<f32> {
        match self {
            DistanceSample::Valid(cm) if cm > 0.0 => Some(cm),
            _ => None,
        }
    }

    pub fn is_valid(self) -> bool {
        self.cm().is_some()
    }
}

/// A single hardware ranging attempt
///
/// Implementations must return within roughly `timeout_us`; the sampler
/// relies on this bound to keep the stream loop responsive.
pub trait RangeProbe {
    fn probe(&mut self, timeout_us: u32) -> Result<f32, SensorFault>;
}

/// Sampler tuning
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Raw probes per sample
    pub probes: usize,
    /// Echo timeout per probe (µs)
    pub probe_timeout_us: u32,
    /// Pause after each probe so echoes never overlap (ms)
    pub probe_spacing_ms: u32,
    /// Exclusive lower bound of the valid band (cm)
    pub min_cm: f32,
    /// Inclusive upper bound of the valid band (cm)
    pub max_cm: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            probes: 5,
            probe_timeout_us: 30_000,
            probe_spacing_ms: 60,
            min_cm: 2.0,
            max_cm: 400.0,
        }
    }
}

pub struct DistanceSampler {
    config: SamplerConfig,
}

impl DistanceSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn in_band(&self, cm: f32) -> bool {
        cm > self.config.min_cm && cm <= self.config.max_cm
    }

    /// Take one de-noised sample
    ///
    /// Blocks for `probes * (timeout + spacing)` in the worst case.
    pub fn sample<R: RangeProbe, D: Delay>(&self, ranger: &mut R, delay: &mut D) -> DistanceSample {
        let mut readings = Vec::with_capacity(self.config.probes);

        for _ in 0..self.config.probes {
            match ranger.probe(self.config.probe_timeout_us) {
                Ok(cm) if self.in_band(cm) => readings.push(cm),
                Ok(cm) => debug!("Probe discarded: {:?}", SensorFault::OutOfRange(cm)),
                Err(e) => debug!("Probe discarded: {:?}", e),
            }
            delay.delay_ms(self.config.probe_spacing_ms);
        }

        match median(&mut readings) {
            Some(cm) => DistanceSample::Valid(cm),
            None => DistanceSample::Invalid,
        }
    }
}

impl Default for DistanceSampler {
    fn default() -> Self {
        Self::new(SamplerConfig::default())
    }
}

/// Median of `values`, sorting them in place
///
/// Even counts average the two middle readings.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
