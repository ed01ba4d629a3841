/// Disturbance classifier
///
/// Two-stage state machine over de-noised distance samples. A first
/// significant change arms the classifier; every significant change after that
/// fires a capture. Each qualifying sample becomes the new baseline, so a slow
/// drift is followed rather than accumulated.
///
/// ```text
///  AwaitingBaseline ──valid──▶ AwaitingFirstChange ──|Δ|>thr──▶ AwaitingSecondChange
///                                                                  │   ▲
///                                                                  └───┘ |Δ|>thr: FIRE
/// ```
///
/// ## Re-arm behaviour
///
/// Firmware revisions disagreed on what happens after a fire. The default
/// [`RearmPolicy::Latch`] stays in `AwaitingSecondChange` so every following
/// deviation fires again. [`RearmPolicy::ResetAfterFire`] returns to
/// `AwaitingFirstChange`, requiring a fresh arming change before the next
/// fire. Both are covered by the tests below.
use crate::sampler::DistanceSample;

/// Classifier stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierStage {
    /// No valid reading seen yet
    AwaitingBaseline,
    /// Baseline settled, waiting for the arming change
    AwaitingFirstChange,
    /// Armed; the next significant change fires
    AwaitingSecondChange,
}

impl ClassifierStage {
    /// Ordinal used in logs (0/1/2)
    pub fn as_u8(&self) -> u8 {
        match self {
            ClassifierStage::AwaitingBaseline => 0,
            ClassifierStage::AwaitingFirstChange => 1,
            ClassifierStage::AwaitingSecondChange => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierStage::AwaitingBaseline => "BASELINE",
            ClassifierStage::AwaitingFirstChange => "FIRST_CHANGE",
            ClassifierStage::AwaitingSecondChange => "ARMED",
        }
    }
}

/// Output of one classification step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Hold,
    Fire,
}

impl TriggerDecision {
    pub fn is_fire(self) -> bool {
        self == TriggerDecision::Fire
    }
}

/// What to do after a fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RearmPolicy {
    /// Stay armed, every later deviation fires
    #[default]
    Latch,
    /// Drop back to `AwaitingFirstChange`
    ResetAfterFire,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// Minimum |Δ| that counts as physical motion (cm)
    pub threshold_cm: f32,
    pub rearm: RearmPolicy,
    /// Fire on the very first valid sample (reference photo at boot)
    pub fire_on_baseline: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold_cm: 1.5,
            rearm: RearmPolicy::Latch,
            fire_on_baseline: false,
        }
    }
}

/// Complete classifier state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierState {
    pub stage: ClassifierStage,
    /// Last distance considered settled (cm)
    pub baseline: Option<f32>,
}

impl ClassifierState {
    pub const INITIAL: Self = Self {
        stage: ClassifierStage::AwaitingBaseline,
        baseline: None,
    };
}

impl Default for ClassifierState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Pure transition function
///
/// Invalid samples leave the state untouched and never fire.
pub fn transition(
    state: ClassifierState,
    sample: DistanceSample,
    config: &ClassifierConfig,
) -> (ClassifierState, TriggerDecision) {
    let d = match sample.cm() {
        Some(d) => d,
        None => return (state, TriggerDecision::Hold),
    };

    let baseline = match (state.stage, state.baseline) {
        (ClassifierStage::AwaitingBaseline, _) | (_, None) => {
            let next = ClassifierState {
                stage: ClassifierStage::AwaitingFirstChange,
                baseline: Some(d),
            };
            let decision = if config.fire_on_baseline {
                TriggerDecision::Fire
            } else {
                TriggerDecision::Hold
            };
            return (next, decision);
        }
        (_, Some(b)) => b,
    };

    if (d - baseline).abs() <= config.threshold_cm {
        return (state, TriggerDecision::Hold);
    }

    let (stage, decision) = match state.stage {
        ClassifierStage::AwaitingSecondChange => match config.rearm {
            RearmPolicy::Latch => (ClassifierStage::AwaitingSecondChange, TriggerDecision::Fire),
            RearmPolicy::ResetAfterFire => (ClassifierStage::AwaitingFirstChange, TriggerDecision::Fire),
        },
        // First significant change arms
        _ => (ClassifierStage::AwaitingSecondChange, TriggerDecision::Hold),
    };

    (
        ClassifierState {
            stage,
            baseline: Some(d),
        },
        decision,
    )
}

/// Stateful wrapper owned by the scheduler
pub struct EventClassifier {
    state: ClassifierState,
    config: ClassifierConfig,
}

impl EventClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            state: ClassifierState::INITIAL,
            config,
        }
    }

    /// Feed one sample, returning whether to capture now
    pub fn classify(&mut self, sample: DistanceSample) -> TriggerDecision {
        let (next, decision) = transition(self.state, sample, &self.config);
        self.state = next;
        decision
    }

    pub fn stage(&self) -> ClassifierStage {
        self.state.stage
    }

    pub fn baseline(&self) -> Option<f32> {
        self.state.baseline
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Forget the baseline and start over
    pub fn reset(&mut self) {
        self.state = ClassifierState::INITIAL;
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESH: f32 = 1.5;

    fn feed(classifier: &mut EventClassifier, samples: &[f32]) -> Vec<TriggerDecision> {
        samples
            .iter()
            .map(|&cm| classifier.classify(DistanceSample::Valid(cm)))
            .collect()
    }

    fn fire_count(decisions: &[TriggerDecision]) -> usize {
        decisions.iter().filter(|d| d.is_fire()).count()
    }

    #[test]
    fn test_first_sample_sets_baseline_without_firing() {
        let mut classifier = EventClassifier::default();
        let decision = classifier.classify(DistanceSample::Valid(40.0));

        assert_eq!(decision, TriggerDecision::Hold);
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingFirstChange);
        assert_eq!(classifier.baseline(), Some(40.0));
    }

    #[test]
    fn test_small_jitter_never_fires() {
        let mut classifier = EventClassifier::default();
        // Wander within ±THRESH of the running baseline
        let samples = [40.0, 41.0, 39.2, 40.5, 41.4, 38.6, 40.0, 39.9, 41.5, 38.5];
        let decisions = feed(&mut classifier, &samples);

        assert_eq!(fire_count(&decisions), 0);
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingFirstChange);
        assert_eq!(classifier.baseline(), Some(40.0));
    }

    #[test]
    fn test_two_deviations_fire_once_after_the_second() {
        let b = 40.0;
        let mut classifier = EventClassifier::default();
        let decisions = feed(&mut classifier, &[b, b + 2.0 * THRESH, b + 4.0 * THRESH]);

        assert_eq!(
            decisions,
            vec![TriggerDecision::Hold, TriggerDecision::Hold, TriggerDecision::Fire]
        );
        assert_eq!(classifier.baseline(), Some(b + 4.0 * THRESH));
    }

    #[test]
    fn test_exact_threshold_is_not_significant() {
        let mut classifier = EventClassifier::default();
        feed(&mut classifier, &[40.0, 41.5]);
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingFirstChange);
    }

    #[test]
    fn test_invalid_samples_are_ignored() {
        let mut classifier = EventClassifier::default();
        assert_eq!(classifier.classify(DistanceSample::Invalid), TriggerDecision::Hold);
        assert_eq!(classifier.state(), ClassifierState::INITIAL);

        feed(&mut classifier, &[40.0, 45.0]);
        let armed = classifier.state();

        assert_eq!(classifier.classify(DistanceSample::Invalid), TriggerDecision::Hold);
        assert_eq!(classifier.classify(DistanceSample::Valid(0.0)), TriggerDecision::Hold);
        assert_eq!(classifier.classify(DistanceSample::Valid(-1.0)), TriggerDecision::Hold);
        assert_eq!(classifier.state(), armed);
    }

    #[test]
    fn test_latch_refires_on_every_deviation() {
        let mut classifier = EventClassifier::default();
        let decisions = feed(&mut classifier, &[40.0, 45.0, 50.0, 50.5, 55.0, 60.0]);

        assert_eq!(
            decisions,
            vec![
                TriggerDecision::Hold,
                TriggerDecision::Hold,
                TriggerDecision::Fire,
                TriggerDecision::Hold,
                TriggerDecision::Fire,
                TriggerDecision::Fire,
            ]
        );
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingSecondChange);
    }

    #[test]
    fn test_reset_after_fire_needs_fresh_arming() {
        // Earlier firmware behaviour, kept selectable
        let mut classifier = EventClassifier::new(ClassifierConfig {
            rearm: RearmPolicy::ResetAfterFire,
            ..Default::default()
        });
        let decisions = feed(&mut classifier, &[40.0, 45.0, 50.0, 55.0, 60.0]);

        assert_eq!(
            decisions,
            vec![
                TriggerDecision::Hold,
                TriggerDecision::Hold,
                TriggerDecision::Fire,
                TriggerDecision::Hold,
                TriggerDecision::Fire,
            ]
        );
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingFirstChange);
    }

    #[test]
    fn test_fire_on_baseline_option() {
        let mut classifier = EventClassifier::new(ClassifierConfig {
            fire_on_baseline: true,
            ..Default::default()
        });
        assert_eq!(classifier.classify(DistanceSample::Valid(40.0)), TriggerDecision::Fire);
        // Only the first sample; normal arming afterwards
        assert_eq!(classifier.classify(DistanceSample::Valid(45.0)), TriggerDecision::Hold);
    }

    #[test]
    fn test_direction_does_not_matter() {
        let mut classifier = EventClassifier::default();
        let decisions = feed(&mut classifier, &[40.0, 35.0, 40.0]);
        assert_eq!(decisions[2], TriggerDecision::Fire);
    }

    #[test]
    fn test_transition_is_pure() {
        let config = ClassifierConfig::default();
        let state = ClassifierState {
            stage: ClassifierStage::AwaitingSecondChange,
            baseline: Some(20.0),
        };

        let (a, da) = transition(state, DistanceSample::Valid(25.0), &config);
        let (b, db) = transition(state, DistanceSample::Valid(25.0), &config);
        assert_eq!((a, da), (b, db));
        assert_eq!(da, TriggerDecision::Fire);
    }

    #[test]
    fn test_reset_returns_to_baseline_stage() {
        let mut classifier = EventClassifier::default();
        feed(&mut classifier, &[40.0, 45.0]);
        classifier.reset();
        assert_eq!(classifier.stage(), ClassifierStage::AwaitingBaseline);
        assert_eq!(classifier.baseline(), None);
    }
}
