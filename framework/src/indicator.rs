//! Indicator light driver
//!
//! Maps the classifier stage to a light pattern on a PWM channel:
//!
//! | Stage                  | Pattern                         |
//! |------------------------|---------------------------------|
//! | `AwaitingBaseline`     | dim blink (20/255, 400 ms half) |
//! | `AwaitingFirstChange`  | dim blink                       |
//! | `AwaitingSecondChange` | dark                            |
//!
//! The light is the camera flash, so it stays well below full brightness
//! and goes dark once armed to keep it out of the triggered photo.

use crate::classifier::ClassifierStage;
use crate::timing::period_elapsed;

/// PWM output for the light (0 = off, 255 = full)
pub trait Indicator {
    fn set_duty(&mut self, duty: u8);
}

#[derive(Debug, Clone, Copy)]
pub struct IndicatorConfig {
    /// Duty for the "on" half of a blink
    pub dim_duty: u8,
    /// Time between toggles (ms)
    pub toggle_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            dim_duty: 20,
            toggle_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPattern {
    Blink,
    Dark,
}

impl IndicatorPattern {
    pub fn for_stage(stage: ClassifierStage) -> Self {
        match stage {
            ClassifierStage::AwaitingBaseline | ClassifierStage::AwaitingFirstChange => {
                IndicatorPattern::Blink
            }
            ClassifierStage::AwaitingSecondChange => IndicatorPattern::Dark,
        }
    }
}

pub struct IndicatorDriver {
    config: IndicatorConfig,
    lit: bool,
    last_toggle_ms: Option<u32>,
    /// Duty last written to hardware
    applied: Option<u8>,
}

impl IndicatorDriver {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            lit: false,
            last_toggle_ms: None,
            applied: None,
        }
    }

    /// Advance the pattern for `stage`; only touches the hardware on change
    pub fn update<L: Indicator>(&mut self, stage: ClassifierStage, now_ms: u32, light: &mut L) {
        let duty = match IndicatorPattern::for_stage(stage) {
            IndicatorPattern::Blink => {
                if period_elapsed(now_ms, self.last_toggle_ms, self.config.toggle_ms) {
                    self.lit = !self.lit;
                    self.last_toggle_ms = Some(now_ms);
                }
                if self.lit {
                    self.config.dim_duty
                } else {
                    0
                }
            }
            IndicatorPattern::Dark => {
                self.lit = false;
                self.last_toggle_ms = None;
                0
            }
        };

        if self.applied != Some(duty) {
            light.set_duty(duty);
            self.applied = Some(duty);
        }
    }

    /// Duty currently on the hardware
    pub fn duty(&self) -> u8 {
        self.applied.unwrap_or(0)
    }
}

impl Default for IndicatorDriver {
    fn default() -> Self {
        Self::new(IndicatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingLight;

    #[test]
    fn test_blinks_while_waiting() {
        let mut driver = IndicatorDriver::default();
        let mut light = RecordingLight::default();

        driver.update(ClassifierStage::AwaitingBaseline, 0, &mut light);
        assert_eq!(driver.duty(), 20);
        driver.update(ClassifierStage::AwaitingBaseline, 200, &mut light);
        assert_eq!(driver.duty(), 20);
        driver.update(ClassifierStage::AwaitingBaseline, 401, &mut light);
        assert_eq!(driver.duty(), 0);
        driver.update(ClassifierStage::AwaitingFirstChange, 802, &mut light);
        assert_eq!(driver.duty(), 20);

        assert_eq!(light.writes, vec![20, 0, 20]);
    }

    #[test]
    fn test_dark_when_armed() {
        let mut driver = IndicatorDriver::default();
        let mut light = RecordingLight::default();

        driver.update(ClassifierStage::AwaitingFirstChange, 0, &mut light);
        driver.update(ClassifierStage::AwaitingSecondChange, 100, &mut light);
        driver.update(ClassifierStage::AwaitingSecondChange, 900, &mut light);

        assert_eq!(driver.duty(), 0);
        assert_eq!(light.writes, vec![20, 0]);
    }

    #[test]
    fn test_blink_restarts_lit_after_armed() {
        let mut driver = IndicatorDriver::default();
        let mut light = RecordingLight::default();

        driver.update(ClassifierStage::AwaitingSecondChange, 0, &mut light);
        driver.update(ClassifierStage::AwaitingFirstChange, 50, &mut light);
        assert_eq!(driver.duty(), 20);
    }
}
