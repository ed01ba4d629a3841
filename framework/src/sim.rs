//! Host stand-ins for the hardware traits
//!
//! Used by the unit tests, the integration tests and the `pantry_sim`
//! example. Every fake records what was done to it so tests can assert on
//! call order and counts.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::camera::FrameSource;
use crate::collector::{Collector, CollectorRoute};
use crate::error::{CaptureFault, NetworkFault, SensorFault, StreamFault};
use crate::indicator::Indicator;
use crate::sampler::RangeProbe;
use crate::stream::FrameSink;
use crate::timing::{Clock, Delay};

/// Ranger that replays a fixed list of probe results, then times out
#[derive(Debug, Default)]
pub struct ScriptedRanger {
    script: VecDeque<Result<f32, SensorFault>>,
    timeouts: Vec<u32>,
}

impl ScriptedRanger {
    pub fn new(script: impl IntoIterator<Item = Result<f32, SensorFault>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            timeouts: Vec::new(),
        }
    }

    /// Append more probe results
    pub fn extend(&mut self, more: impl IntoIterator<Item = Result<f32, SensorFault>>) {
        self.script.extend(more);
    }

    /// Queue `probes` identical readings, one full sample's worth
    pub fn hold(&mut self, cm: f32, probes: usize) {
        self.extend(std::iter::repeat(Ok(cm)).take(probes));
    }

    pub fn probes_taken(&self) -> usize {
        self.timeouts.len()
    }

    /// Timeout passed to each probe, in order
    pub fn timeouts_seen(&self) -> &[u32] {
        &self.timeouts
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RangeProbe for ScriptedRanger {
    fn probe(&mut self, timeout_us: u32) -> Result<f32, SensorFault> {
        self.timeouts.push(timeout_us);
        self.script.pop_front().unwrap_or(Err(SensorFault::Timeout))
    }
}

/// Settable clock shared between a driver loop and its delay
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Arc<AtomicU32>,
}

impl SimClock {
    pub fn starting_at(ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(ms)),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Delay that only counts, or also moves a [`SimClock`] forward
#[derive(Debug, Default)]
pub struct SimDelay {
    pub total_ms: u32,
    clock: Option<SimClock>,
}

impl SimDelay {
    pub fn driving(clock: SimClock) -> Self {
        Self {
            total_ms: 0,
            clock: Some(clock),
        }
    }
}

impl Delay for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
        if let Some(clock) = &self.clock {
            clock.advance(ms);
        }
    }
}

/// Camera producing numbered JPEG-shaped frames
#[derive(Debug, Default)]
pub struct SimCamera {
    acquired: u32,
    released: u32,
    fail_next: u32,
}

impl SimCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` acquisitions fail
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }

    /// Bytes of the `n`th successfully acquired frame (1-based)
    pub fn frame_bytes(&self, n: u32) -> Vec<u8> {
        let body_len = 8 + (n as usize % 5) * 4;
        let mut data = Vec::with_capacity(body_len + 4);
        data.extend_from_slice(&[0xFF, 0xD8]);
        data.extend((0..body_len).map(|i| (n as usize + i) as u8));
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    pub fn acquired(&self) -> u32 {
        self.acquired
    }

    pub fn released(&self) -> u32 {
        self.released
    }

    /// Frames acquired but not yet released
    pub fn in_flight(&self) -> u32 {
        self.acquired - self.released
    }
}

/// Frame guard for [`SimCamera`]
pub struct SimFrame<'a> {
    released: &'a mut u32,
    data: Vec<u8>,
}

impl Deref for SimFrame<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for SimFrame<'_> {
    fn drop(&mut self) {
        *self.released += 1;
    }
}

impl FrameSource for SimCamera {
    type Frame<'a> = SimFrame<'a>;

    fn acquire(&mut self) -> Result<SimFrame<'_>, CaptureFault> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(CaptureFault::FrameUnavailable);
        }
        self.acquired += 1;
        let data = self.frame_bytes(self.acquired);
        Ok(SimFrame {
            released: &mut self.released,
            data,
        })
    }
}

/// One recorded POST
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub route: CollectorRoute,
    pub body: Vec<u8>,
    pub timeout_ms: u32,
}

/// Collector that records every POST and answers with a fixed response
#[derive(Debug)]
pub struct RecordingCollector {
    link_up: bool,
    response: Result<u16, NetworkFault>,
    posts: Vec<PostRecord>,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self {
            link_up: true,
            response: Ok(200),
            posts: Vec::new(),
        }
    }

    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }

    /// Answer every following POST with `response`
    pub fn respond_with(&mut self, response: Result<u16, NetworkFault>) {
        self.response = response;
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn posts_to(&self, route: CollectorRoute) -> usize {
        self.posts.iter().filter(|p| p.route == route).count()
    }
}

impl Default for RecordingCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for RecordingCollector {
    fn link_up(&self) -> bool {
        self.link_up
    }

    fn post(&mut self, route: CollectorRoute, body: &[u8], timeout_ms: u32) -> Result<u16, NetworkFault> {
        self.posts.push(PostRecord {
            route,
            body: body.to_vec(),
            timeout_ms,
        });
        self.response.clone()
    }
}

/// Stream client that keeps every chunk, optionally hanging up
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub chunks: Vec<Vec<u8>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` chunks, then report a disconnect
    pub fn failing_after(n: usize) -> Self {
        Self {
            chunks: Vec::new(),
            fail_after: Some(n),
        }
    }

    /// Everything written so far, concatenated
    pub fn body(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

impl FrameSink for RecordingSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StreamFault> {
        if self.fail_after.is_some_and(|n| self.chunks.len() >= n) {
            return Err(StreamFault::Disconnected);
        }
        self.chunks.push(chunk.to_vec());
        Ok(())
    }
}

/// Light that records every duty write
#[derive(Debug, Default)]
pub struct RecordingLight {
    pub writes: Vec<u8>,
}

impl Indicator for RecordingLight {
    fn set_duty(&mut self, duty: u8) {
        self.writes.push(duty);
    }
}
