//! Fault taxonomy for the capture pipeline.
//!
//! Every fault here is recoverable at the tick level. The only fatal category
//! (camera or peripheral init failure) lives in the firmware, which restarts
//! the device instead of returning an error.

/// Ranging probe failures. Discarded by the sampler, never surfaced further.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SensorFault {
    #[error("echo timed out")]
    Timeout,
    #[error("reading {0:.1} cm outside the valid band")]
    OutOfRange(f32),
}

/// Camera or buffer failures during a capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFault {
    #[error("camera frame unavailable")]
    FrameUnavailable,
    #[error("camera returned an empty frame")]
    EmptyFrame,
    #[error("failed to allocate {0} byte snapshot buffer")]
    Allocation(usize),
}

/// Outbound push failures. Dropped silently, retried only by the next schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkFault {
    #[error("network link is down")]
    LinkDown,
    #[error("collector answered HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// The stream client went away mid-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamFault {
    #[error("stream client disconnected")]
    Disconnected,
}
