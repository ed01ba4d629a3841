/// Aggregate tuning for the capture pipeline
///
/// Every value is compiled in; the firmware layers its network settings on top
/// in its own `SystemConfig`.
use crate::arbiter::ArbiterConfig;
use crate::classifier::ClassifierConfig;
use crate::indicator::IndicatorConfig;
use crate::pacer::PacerConfig;
use crate::sampler::SamplerConfig;
use crate::scheduler::SchedulerConfig;
use crate::status::StatusConfig;

#[derive(Debug, Clone, Default)]
pub struct TriggerConfig {
    pub sampler: SamplerConfig,
    pub classifier: ClassifierConfig,
    pub arbiter: ArbiterConfig,
    pub pacer: PacerConfig,
    pub indicator: IndicatorConfig,
    pub scheduler: SchedulerConfig,
    pub status: StatusConfig,
}

impl TriggerConfig {
    /// No settle pause; handy for bench tests where nothing moves
    pub fn without_settle() -> Self {
        let mut config = Self::default();
        config.arbiter.settle_ms = 0;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RearmPolicy;

    #[test]
    fn test_defaults() {
        let config = TriggerConfig::default();
        assert_eq!(config.sampler.probes, 5);
        assert_eq!(config.sampler.probe_timeout_us, 30_000);
        assert_eq!(config.classifier.threshold_cm, 1.5);
        assert_eq!(config.classifier.rearm, RearmPolicy::Latch);
        assert!(!config.classifier.fire_on_baseline);
        assert_eq!(config.arbiter.cooldown_ms, 2000);
        assert_eq!(config.arbiter.settle_ms, 3000);
        assert_eq!(config.pacer.min_period_ms, 800);
        assert_eq!(config.pacer.timeout_ms, 2500);
        assert_eq!(config.scheduler.poll_period_ms, 150);
        assert_eq!(config.status.period_ms, 3000);
        assert_eq!(config.indicator.dim_duty, 20);
    }

    #[test]
    fn test_without_settle() {
        let config = TriggerConfig::without_settle();
        assert_eq!(config.arbiter.settle_ms, 0);
        assert_eq!(config.arbiter.cooldown_ms, 2000);
    }
}
