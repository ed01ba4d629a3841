//! Capture arbiter
//!
//! Decides, once per tick, whether a fire decision turns into a triggered
//! snapshot. The camera is single-buffered and shared with the live stream,
//! so the arbiter runs strictly before the stream acquires its frame and
//! holds the frame only long enough to copy it.
//!
//! Sequence on an accepted fire:
//!
//! ```text
//! settle pause ─▶ acquire ─▶ copy ─▶ store ─▶ release ─▶ push_immediate
//! ```
//!
//! Any failure before `store` abandons the attempt, leaves the retained
//! snapshot untouched and does not start a cooldown, so the next fire is
//! free to try again.

use std::sync::Arc;

use log::{info, warn};

use crate::camera::{copy_frame, FrameSource};
use crate::classifier::TriggerDecision;
use crate::collector::Collector;
use crate::error::CaptureFault;
use crate::pacer::{PushOutcome, UploadPacer};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::timing::{elapsed_ms, Clock, Delay};

#[derive(Debug, Clone, Copy)]
pub struct ArbiterConfig {
    /// Minimum gap between triggered captures (ms)
    pub cooldown_ms: u32,
    /// Pause between the fire and the capture so the scene stops moving (ms).
    /// Zero disables it.
    pub settle_ms: u32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2000,
            settle_ms: 3000,
        }
    }
}

/// What the arbiter did with one decision
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No fire this tick
    NotRequested,
    /// Fire arrived inside the cooldown window
    CoolingDown { remaining_ms: u32 },
    /// Snapshot retained; `uploaded` reports the immediate push
    Captured { bytes: usize, uploaded: bool },
    /// Attempt abandoned
    Failed(CaptureFault),
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureOutcome::Captured { .. })
    }
}

pub struct CaptureArbiter {
    config: ArbiterConfig,
    last_capture_ms: Option<u32>,
    captures: u32,
    failures: u32,
}

impl CaptureArbiter {
    pub fn new(config: ArbiterConfig) -> Self {
        Self {
            config,
            last_capture_ms: None,
            captures: 0,
            failures: 0,
        }
    }

    /// Remaining cooldown at `now_ms`, `None` when a capture may start
    ///
    /// A `now_ms` slightly behind the last capture (a timestamp taken before
    /// the settle pause) still counts as cooling down instead of wrapping
    /// around to "long ago".
    pub fn cooldown_remaining(&self, now_ms: u32) -> Option<u32> {
        let last = self.last_capture_ms?;
        let since = elapsed_ms(now_ms, last);
        if since <= self.config.cooldown_ms {
            return Some(self.config.cooldown_ms - since);
        }

        let behind = elapsed_ms(last, now_ms);
        if behind <= self.config.cooldown_ms.saturating_add(self.config.settle_ms) {
            Some(self.config.cooldown_ms.saturating_add(behind))
        } else {
            None
        }
    }

    /// Act on one classifier decision
    ///
    /// The clock is read once for the cooldown check and again after the
    /// settle pause to stamp the capture.
    #[allow(clippy::too_many_arguments)]
    pub fn on_decision<K, C, N, D>(
        &mut self,
        decision: TriggerDecision,
        clock: &K,
        camera: &mut C,
        store: &SnapshotStore,
        pacer: &mut UploadPacer,
        collector: &mut N,
        delay: &mut D,
    ) -> CaptureOutcome
    where
        K: Clock,
        C: FrameSource,
        N: Collector,
        D: Delay,
    {
        if !decision.is_fire() {
            return CaptureOutcome::NotRequested;
        }

        if let Some(remaining_ms) = self.cooldown_remaining(clock.now_ms()) {
            info!("Trigger ignored, cooling down ({} ms left)", remaining_ms);
            return CaptureOutcome::CoolingDown { remaining_ms };
        }

        if self.config.settle_ms > 0 {
            delay.delay_ms(self.config.settle_ms);
        }
        let captured_at_ms = clock.now_ms();

        let snapshot = match capture_snapshot(camera, store, captured_at_ms) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Triggered capture failed: {}", e);
                self.failures += 1;
                return CaptureOutcome::Failed(e);
            }
        };

        self.last_capture_ms = Some(captured_at_ms);
        self.captures += 1;
        info!("Triggered capture saved ({} bytes)", snapshot.len());

        let uploaded = match pacer.push_immediate(snapshot.bytes(), collector) {
            PushOutcome::Sent => true,
            PushOutcome::Skipped | PushOutcome::Dropped(_) => false,
        };

        CaptureOutcome::Captured {
            bytes: snapshot.len(),
            uploaded,
        }
    }

    /// (captures, failures) since boot
    pub fn get_stats(&self) -> (u32, u32) {
        (self.captures, self.failures)
    }
}

impl Default for CaptureArbiter {
    fn default() -> Self {
        Self::new(ArbiterConfig::default())
    }
}

/// Acquire, copy and retain one frame; the frame is released before returning
fn capture_snapshot<C: FrameSource>(
    camera: &mut C,
    store: &SnapshotStore,
    captured_at_ms: u32,
) -> Result<Arc<Snapshot>, CaptureFault> {
    let frame = camera.acquire()?;
    let data = copy_frame(&frame)?;
    let snapshot = store.store(Snapshot::new(data, captured_at_ms));
    drop(frame);
    Ok(snapshot)
}
