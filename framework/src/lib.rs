//! Camera Sensor Node Capture Framework
//!
//! Hardware-independent core of a camera node that watches a shelf with an
//! ultrasonic ranger, snaps a photo when something on it moves, and relays
//! both the triggered photo and a slow live feed to a collector service.
//!
//! ## Features
//!
//! - **Noise-tolerant ranging**: median of a probe burst, bad probes dropped
//! - **Two-stage disturbance detection**: arm on the first change, fire on the next
//! - **Single-buffer camera arbitration**: triggered snapshots and the live
//!   stream never hold a frame at the same time
//! - **Paced uplink**: periodic live frames, immediate triggered snapshots
//! - **Host testable**: every hardware touch point is a trait with a fake in [`sim`]
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  CaptureScheduler (one tick per stream frame) │
//! ├──────────────┬────────────────┬───────────────┤
//! │ Sampler      │ CaptureArbiter │ UploadPacer   │
//! │ Classifier   │ SnapshotStore  │ Indicator     │
//! ├──────────────┴────────────────┴───────────────┤
//! │  RangeProbe · FrameSource · Collector ·       │
//! │  FrameSink · Indicator · Delay · Clock        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use capture_framework::sim::{
//!     RecordingCollector, RecordingLight, RecordingSink, ScriptedRanger, SimCamera, SimClock,
//!     SimDelay,
//! };
//! use capture_framework::{CaptureScheduler, Rig, SnapshotStore, TriggerConfig};
//!
//! let clock = SimClock::default();
//! let mut rig = Rig {
//!     ranger: ScriptedRanger::default(),
//!     camera: SimCamera::new(),
//!     collector: RecordingCollector::new(),
//!     light: RecordingLight::default(),
//!     delay: SimDelay::driving(clock.clone()),
//! };
//! let mut scheduler = CaptureScheduler::new(&TriggerConfig::default(), SnapshotStore::new());
//!
//! // Runs until the client disconnects
//! let fault = scheduler.serve(&clock, &mut rig, &mut RecordingSink::failing_after(300));
//! ```
//!
//! ## Modules
//!
//! - [`sampler`] - Probe burst to one distance sample
//! - [`classifier`] - Disturbance state machine
//! - [`arbiter`] - Cooldown-gated triggered capture
//! - [`snapshot`] - Single-slot retained snapshot
//! - [`pacer`] - Collector upload pacing
//! - [`scheduler`] - Per-client stream loop
//! - [`status`] - Liveness reports

pub mod arbiter;
pub mod camera;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod indicator;
pub mod pacer;
pub mod sampler;
pub mod scheduler;
pub mod sim;
pub mod snapshot;
pub mod status;
pub mod stream;
pub mod timing;

// Re-export commonly used types
pub use arbiter::{ArbiterConfig, CaptureArbiter, CaptureOutcome};
pub use camera::FrameSource;
pub use classifier::{ClassifierConfig, ClassifierStage, EventClassifier, RearmPolicy, TriggerDecision};
pub use collector::{Collector, CollectorRoute};
pub use config::TriggerConfig;
pub use error::{CaptureFault, NetworkFault, SensorFault, StreamFault};
pub use indicator::Indicator;
pub use pacer::{PushOutcome, UploadPacer};
pub use sampler::{DistanceSample, DistanceSampler, RangeProbe};
pub use scheduler::{CaptureScheduler, Rig, TickReport};
pub use snapshot::{Snapshot, SnapshotStore};
pub use status::{BatteryGauge, StatusReporter};
pub use stream::FrameSink;
pub use timing::{Clock, Delay};
