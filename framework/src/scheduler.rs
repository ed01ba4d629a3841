//! Capture/stream scheduling loop
//!
//! One [`CaptureScheduler::tick`] is one iteration of a stream client's loop:
//!
//! 1. update the indicator for the current classifier stage
//! 2. poll the distance sampler (rate limited) and classify
//! 3. hand the decision to the capture arbiter
//! 4. acquire one live frame, offer it to the upload pacer
//! 5. emit it to the client
//!
//! Steps 3 and 4 both use the camera. They are sequenced inside the tick and
//! the arbiter's frame is released before step 4 acquires, so acquisitions
//! never overlap. The live frame is held through the periodic push and the
//! emit and released at the end of the tick.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::arbiter::{CaptureArbiter, CaptureOutcome};
use crate::camera::FrameSource;
use crate::classifier::{EventClassifier, TriggerDecision};
use crate::collector::Collector;
use crate::config::TriggerConfig;
use crate::error::StreamFault;
use crate::indicator::{Indicator, IndicatorDriver};
use crate::pacer::{PushOutcome, UploadPacer};
use crate::sampler::{DistanceSample, DistanceSampler, RangeProbe};
use crate::snapshot::SnapshotStore;
use crate::stream::{emit_frame, FrameSink};
use crate::timing::{period_elapsed, Clock, Delay};

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Minimum gap between distance polls (ms)
    pub poll_period_ms: u32,
    /// Yield between ticks (ms)
    pub yield_ms: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 150,
            yield_ms: 1,
        }
    }
}

/// Hardware the loop drives
pub struct Rig<R, C, N, L, D> {
    pub ranger: R,
    pub camera: C,
    pub collector: N,
    pub light: L,
    pub delay: D,
}

/// What happened in one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// `None` when the poll was rate limited
    pub sample: Option<DistanceSample>,
    pub decision: TriggerDecision,
    pub capture: CaptureOutcome,
    pub push: PushOutcome,
    /// Bytes emitted to the client, `None` if no live frame was available
    pub frame_len: Option<usize>,
}

pub struct CaptureScheduler {
    config: SchedulerConfig,
    sampler: DistanceSampler,
    classifier: EventClassifier,
    arbiter: CaptureArbiter,
    pacer: UploadPacer,
    indicator: IndicatorDriver,
    store: Arc<SnapshotStore>,
    last_poll_ms: Option<u32>,
}

impl CaptureScheduler {
    pub fn new(config: &TriggerConfig, store: Arc<SnapshotStore>) -> Self {
        Self {
            config: config.scheduler,
            sampler: DistanceSampler::new(config.sampler),
            classifier: EventClassifier::new(config.classifier),
            arbiter: CaptureArbiter::new(config.arbiter),
            pacer: UploadPacer::new(config.pacer),
            indicator: IndicatorDriver::new(config.indicator),
            store,
            last_poll_ms: None,
        }
    }

    pub fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    pub fn arbiter(&self) -> &CaptureArbiter {
        &self.arbiter
    }

    pub fn pacer(&self) -> &UploadPacer {
        &self.pacer
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Run one loop iteration
    ///
    /// Only a failed emit is an error; every other fault is logged and
    /// absorbed here. The clock is read again after the poll and the
    /// arbiter, since both may block for a while.
    pub fn tick<K, R, C, N, L, D, S>(
        &mut self,
        clock: &K,
        rig: &mut Rig<R, C, N, L, D>,
        sink: &mut S,
    ) -> Result<TickReport, StreamFault>
    where
        K: Clock,
        R: RangeProbe,
        C: FrameSource,
        N: Collector,
        L: Indicator,
        D: Delay,
        S: FrameSink,
    {
        let now_ms = clock.now_ms();
        self.indicator.update(self.classifier.stage(), now_ms, &mut rig.light);

        let sample = self.poll(now_ms, rig);
        let decision = match sample {
            Some(sample) => self.classifier.classify(sample),
            None => TriggerDecision::Hold,
        };

        let capture = self.arbiter.on_decision(
            decision,
            clock,
            &mut rig.camera,
            &self.store,
            &mut self.pacer,
            &mut rig.collector,
            &mut rig.delay,
        );

        let frame = match rig.camera.acquire() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Camera capture failed: {}", e);
                return Ok(TickReport {
                    sample,
                    decision,
                    capture,
                    push: PushOutcome::Skipped,
                    frame_len: None,
                });
            }
        };

        let push = self.pacer.push_periodic(clock.now_ms(), &frame, &mut rig.collector);
        emit_frame(sink, &frame)?;

        Ok(TickReport {
            sample,
            decision,
            capture,
            push,
            frame_len: Some(frame.len()),
        })
    }

    fn poll<R, C, N, L, D>(&mut self, now_ms: u32, rig: &mut Rig<R, C, N, L, D>) -> Option<DistanceSample>
    where
        R: RangeProbe,
        D: Delay,
    {
        if !period_elapsed(now_ms, self.last_poll_ms, self.config.poll_period_ms) {
            return None;
        }
        self.last_poll_ms = Some(now_ms);

        let sample = self.sampler.sample(&mut rig.ranger, &mut rig.delay);
        match sample.cm() {
            Some(cm) => info!(
                "Dist: {:.1} cm (baseline={:.1} stage={})",
                cm,
                self.classifier.baseline().unwrap_or(-1.0),
                self.classifier.stage().as_u8()
            ),
            None => debug!("Dist: no valid echo"),
        }
        Some(sample)
    }

    /// Drive ticks until the client goes away
    pub fn serve<K, R, C, N, L, D, S>(
        &mut self,
        clock: &K,
        rig: &mut Rig<R, C, N, L, D>,
        sink: &mut S,
    ) -> StreamFault
    where
        K: Clock,
        R: RangeProbe,
        C: FrameSource,
        N: Collector,
        L: Indicator,
        D: Delay,
        S: FrameSink,
    {
        info!("Stream client connected");
        loop {
            if let Err(fault) = self.tick(clock, rig, sink) {
                info!("Stream client gone: {}", fault);
                return fault;
            }
            rig.delay.delay_ms(self.config.yield_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorFault;
    use crate::sim::{
        RecordingCollector, RecordingLight, RecordingSink, ScriptedRanger, SimCamera, SimClock, SimDelay,
    };

    type SimRig = Rig<ScriptedRanger, SimCamera, RecordingCollector, RecordingLight, SimDelay>;

    fn rig(readings: impl IntoIterator<Item = Result<f32, SensorFault>>) -> SimRig {
        Rig {
            ranger: ScriptedRanger::new(readings),
            camera: SimCamera::new(),
            collector: RecordingCollector::new(),
            light: RecordingLight::default(),
            delay: SimDelay::default(),
        }
    }

    fn scheduler() -> CaptureScheduler {
        CaptureScheduler::new(&TriggerConfig::without_settle(), SnapshotStore::new())
    }

    fn at(ms: u32) -> SimClock {
        SimClock::starting_at(ms)
    }

    #[test]
    fn test_tick_emits_one_frame() {
        let mut scheduler = scheduler();
        let mut rig = rig([Ok(40.0); 5]);
        let mut sink = RecordingSink::new();

        let report = scheduler.tick(&at(0), &mut rig, &mut sink).unwrap();
        assert_eq!(report.sample, Some(DistanceSample::Valid(40.0)));
        assert_eq!(report.decision, TriggerDecision::Hold);
        assert_eq!(report.push, PushOutcome::Sent);
        assert_eq!(report.frame_len, Some(rig.camera.frame_bytes(1).len()));
        assert_eq!(sink.chunks.len(), 3);
        assert_eq!(rig.camera.in_flight(), 0);
    }

    #[test]
    fn test_poll_is_rate_limited() {
        let mut scheduler = scheduler();
        let mut rig = rig([Ok(40.0); 10]);
        let mut sink = RecordingSink::new();

        scheduler.tick(&at(0), &mut rig, &mut sink).unwrap();
        let report = scheduler.tick(&at(150), &mut rig, &mut sink).unwrap();
        assert_eq!(report.sample, None);
        assert_eq!(rig.ranger.probes_taken(), 5);

        let report = scheduler.tick(&at(151), &mut rig, &mut sink).unwrap();
        assert!(report.sample.is_some());
        assert_eq!(rig.ranger.probes_taken(), 10);
    }

    #[test]
    fn test_missing_live_frame_is_not_fatal() {
        let mut scheduler = scheduler();
        let mut rig = rig([Ok(40.0); 5]);
        let mut sink = RecordingSink::new();
        rig.camera.fail_next(1);

        let report = scheduler.tick(&at(0), &mut rig, &mut sink).unwrap();
        assert_eq!(report.frame_len, None);
        assert!(sink.chunks.is_empty());
    }

    #[test]
    fn test_disconnect_ends_tick_and_releases_frame() {
        let mut scheduler = scheduler();
        let mut rig = rig([Ok(40.0); 5]);
        let mut sink = RecordingSink::failing_after(0);

        assert_eq!(
            scheduler.tick(&at(0), &mut rig, &mut sink),
            Err(StreamFault::Disconnected)
        );
        assert_eq!(rig.camera.in_flight(), 0);
    }

    #[test]
    fn test_trigger_captures_before_live_frame() {
        let mut scheduler = scheduler();
        let mut rig = rig(
            [40.0, 45.0, 50.0]
                .into_iter()
                .flat_map(|cm| std::iter::repeat(Ok(cm)).take(5)),
        );
        let mut sink = RecordingSink::new();

        scheduler.tick(&at(0), &mut rig, &mut sink).unwrap();
        scheduler.tick(&at(200), &mut rig, &mut sink).unwrap();
        let report = scheduler.tick(&at(400), &mut rig, &mut sink).unwrap();

        assert_eq!(report.decision, TriggerDecision::Fire);
        assert!(report.capture.is_captured());
        // Frames 1, 2 streamed; frame 3 retained; frame 4 streamed
        let snap = scheduler.store().read().unwrap();
        assert_eq!(snap.bytes(), rig.camera.frame_bytes(3).as_slice());
        assert_eq!(rig.camera.acquired(), 4);
    }

    #[test]
    fn test_periodic_push_uses_time_after_settle_pause() {
        let clock = SimClock::default();
        let mut scheduler = CaptureScheduler::new(&TriggerConfig::default(), SnapshotStore::new());
        let mut rig = rig(
            [40.0, 45.0, 50.0]
                .into_iter()
                .flat_map(|cm| std::iter::repeat(Ok(cm)).take(5)),
        );
        rig.delay = SimDelay::driving(clock.clone());
        let mut sink = RecordingSink::new();

        // Each poll spends 300 ms on probe spacing; the first push lands at 300
        scheduler.tick(&clock, &mut rig, &mut sink).unwrap();
        scheduler.tick(&clock, &mut rig, &mut sink).unwrap();
        assert_eq!(clock.now_ms(), 600);

        // Poll (300 ms) and settle pause (3000 ms) both block this tick
        let report = scheduler.tick(&clock, &mut rig, &mut sink).unwrap();
        assert!(report.capture.is_captured());
        assert_eq!(clock.now_ms(), 3900);
        assert_eq!(scheduler.store().read().unwrap().captured_at_ms(), 3900);

        // The tick began 300 ms after the last push; the frame goes out
        // stamped with the time after the pause
        assert_eq!(report.push, PushOutcome::Sent);
    }
}
