//! Upload pacer
//!
//! Live frames go to the collector at a low fixed rate so the stream never
//! waits on the uplink more than once per period. Triggered snapshots skip the
//! gate and go out immediately. Failed sends are dropped; the next period is
//! the retry.

use log::debug;

use crate::collector::{deliver, Collector, CollectorRoute};
use crate::error::NetworkFault;
use crate::timing::period_elapsed;

#[derive(Debug, Clone, Copy)]
pub struct PacerConfig {
    /// Minimum gap between periodic frame pushes (ms)
    pub min_period_ms: u32,
    /// POST timeout (ms)
    pub timeout_ms: u32,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            min_period_ms: 800, // ~1.25 frames/s
            timeout_ms: 2500,
        }
    }
}

/// Result of one push request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    /// Periodic gate closed, nothing attempted
    Skipped,
    /// Attempted and dropped
    Dropped(NetworkFault),
}

impl PushOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PushOutcome::Sent)
    }
}

pub struct UploadPacer {
    config: PacerConfig,
    last_push_ms: Option<u32>,
    sent_count: u32,
    dropped_count: u32,
}

impl UploadPacer {
    pub fn new(config: PacerConfig) -> Self {
        Self {
            config,
            last_push_ms: None,
            sent_count: 0,
            dropped_count: 0,
        }
    }

    /// Push a live frame if the period has elapsed
    ///
    /// The slot is consumed as soon as the gate opens, whether or not the
    /// send succeeds, so a dead collector costs at most one timeout per
    /// period.
    pub fn push_periodic<N: Collector>(
        &mut self,
        now_ms: u32,
        frame: &[u8],
        collector: &mut N,
    ) -> PushOutcome {
        if !period_elapsed(now_ms, self.last_push_ms, self.config.min_period_ms) {
            return PushOutcome::Skipped;
        }
        self.last_push_ms = Some(now_ms);
        self.send(CollectorRoute::Frame, frame, collector)
    }

    /// Push a triggered snapshot right now, bypassing the periodic gate
    pub fn push_immediate<N: Collector>(&mut self, snapshot: &[u8], collector: &mut N) -> PushOutcome {
        self.send(CollectorRoute::Capture, snapshot, collector)
    }

    fn send<N: Collector>(&mut self, route: CollectorRoute, body: &[u8], collector: &mut N) -> PushOutcome {
        match deliver(collector, route, body, self.config.timeout_ms) {
            Ok(()) => {
                self.sent_count += 1;
                PushOutcome::Sent
            }
            Err(e) => {
                debug!("Push to {} dropped: {}", route.path(), e);
                self.dropped_count += 1;
                PushOutcome::Dropped(e)
            }
        }
    }

    /// (sent, dropped) since the last reset
    pub fn get_stats(&self) -> (u32, u32) {
        (self.sent_count, self.dropped_count)
    }

    pub fn reset_stats(&mut self) {
        self.sent_count = 0;
        self.dropped_count = 0;
    }
}

impl Default for UploadPacer {
    fn default() -> Self {
        Self::new(PacerConfig::default())
    }
}
