//! Simulates a pantry shelf being restocked in front of the camera node
//!
//! Replays a noisy ultrasonic signal through the full stream loop with fake
//! hardware and a simulated clock:
//!
//! STABLE SHELF → ITEM REMOVED → ITEM ADDED → RAPID SHUFFLE → STABLE SHELF
//!
//! **Key test**: sensor jitter, dropped echoes and the odd multipath echo must
//! not trigger anything. The removal arms the classifier, the restock fires a
//! triggered snapshot, and the shuffle that follows inside the cooldown window
//! must not take a second one.
//!
//! Run with: cargo run -p capture-framework --example pantry_sim

use capture_framework::sim::{
    RecordingCollector, RecordingLight, RecordingSink, ScriptedRanger, SimCamera, SimClock, SimDelay,
};
use capture_framework::{
    CaptureOutcome, CaptureScheduler, Clock, CollectorRoute, Delay, Rig, SensorFault, SnapshotStore,
    TickReport, TriggerConfig,
};

type SimRig = Rig<ScriptedRanger, SimCamera, RecordingCollector, RecordingLight, SimDelay>;

/// Simple pseudo-random noise generator (deterministic for reproducibility)
struct NoiseGen {
    state: u32,
}

impl NoiseGen {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1)
    fn unit(&mut self) -> f32 {
        // Simple LCG
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns noise in range [-amplitude, +amplitude]
    fn next(&mut self, amplitude: f32) -> f32 {
        (self.unit() * 2.0 - 1.0) * amplitude
    }
}

/// Queue one sample's worth of probes for a shelf at `cm`
///
/// At most one bounced echo and one missed echo per sample, so the median
/// always has a clean majority to work with.
fn queue_probes(ranger: &mut ScriptedRanger, noise: &mut NoiseGen, cm: f32) {
    for i in 0..5 {
        let roll = noise.unit();
        let probe = match i {
            2 if roll < 0.2 => Ok(cm * 3.0), // multipath bounce off the back wall
            4 if roll < 0.3 => Err(SensorFault::Timeout), // missed echo
            _ => Ok(cm + noise.next(0.4)),
        };
        ranger.extend([probe]);
    }
}

fn describe(report: &TickReport) -> String {
    match &report.capture {
        CaptureOutcome::NotRequested => String::new(),
        CaptureOutcome::CoolingDown { remaining_ms } => {
            format!(" → trigger ignored ({} ms cooldown left)", remaining_ms)
        }
        CaptureOutcome::Captured { bytes, uploaded } => {
            format!(" → SNAPSHOT {} bytes, uploaded={}", bytes, uploaded)
        }
        CaptureOutcome::Failed(e) => format!(" → capture failed: {}", e),
    }
}

/// Run `ticks` loop iterations with the shelf at `cm`
fn run_phase(
    scheduler: &mut CaptureScheduler,
    rig: &mut SimRig,
    clock: &SimClock,
    sink: &mut RecordingSink,
    noise: &mut NoiseGen,
    cm: f32,
    ticks: usize,
) -> usize {
    let mut captures = 0;
    for _ in 0..ticks {
        queue_probes(&mut rig.ranger, noise, cm);
        let now = clock.now_ms();

        let report = match scheduler.tick(clock, rig, sink) {
            Ok(report) => report,
            Err(e) => {
                println!("  stream ended: {}", e);
                return captures;
            }
        };
        if report.capture.is_captured() {
            captures += 1;
        }

        if let Some(sample) = report.sample {
            println!(
                "  t={:>6.2}s: dist={:>6} stage={:<12} baseline={:>5.1}{}",
                now as f32 / 1000.0,
                sample.cm().map_or("--".to_string(), |cm| format!("{:.1}", cm)),
                scheduler.classifier().stage().as_str(),
                scheduler.classifier().baseline().unwrap_or(0.0),
                describe(&report)
            );
        }

        rig.delay.delay_ms(1);
    }
    captures
}

fn main() {
    let clock = SimClock::default();
    let mut rig: SimRig = Rig {
        ranger: ScriptedRanger::default(),
        camera: SimCamera::new(),
        collector: RecordingCollector::new(),
        light: RecordingLight::default(),
        delay: SimDelay::driving(clock.clone()),
    };
    let store = SnapshotStore::new();
    let mut scheduler = CaptureScheduler::new(&TriggerConfig::default(), store.clone());
    let mut sink = RecordingSink::new();
    let mut noise = NoiseGen::new(7);

    println!("=== Pantry Shelf Capture Simulation ===\n");
    println!("This simulates: STABLE → ITEM REMOVED → ITEM ADDED → SHUFFLE → STABLE\n");

    println!("Phase 1: STABLE SHELF (40 cm, ±0.4 cm jitter, dropped and bounced echoes)");
    let stable_captures = run_phase(&mut scheduler, &mut rig, &clock, &mut sink, &mut noise, 40.0, 12);
    println!();

    println!("Phase 2: ITEM REMOVED (shelf reads 46 cm)");
    println!("  Expect: classifier arms, no capture, indicator goes dark");
    run_phase(&mut scheduler, &mut rig, &clock, &mut sink, &mut noise, 46.0, 4);
    println!();

    println!("Phase 3: ITEM ADDED (shelf reads 33 cm)");
    println!("  Expect: one triggered snapshot after the 3 s settle pause");
    let restock_captures = run_phase(&mut scheduler, &mut rig, &clock, &mut sink, &mut noise, 33.0, 3);
    println!();

    println!("Phase 4: RAPID SHUFFLE (33 → 37 cm within the cooldown)");
    let shuffle_captures = run_phase(&mut scheduler, &mut rig, &clock, &mut sink, &mut noise, 37.0, 2);
    println!();

    println!("Phase 5: STABLE SHELF (37 cm)");
    let settled_captures = run_phase(&mut scheduler, &mut rig, &clock, &mut sink, &mut noise, 37.0, 10);

    println!("\n=== Simulation Complete ===");
    println!("\nSummary:");
    println!("  Simulated time:       {:.1} s", clock.now_ms() as f32 / 1000.0);
    println!("  Frames streamed:      {}", sink.chunks.len() / 3);
    println!(
        "  Live frames pushed:   {}",
        rig.collector.posts_to(CollectorRoute::Frame)
    );
    println!(
        "  Snapshots pushed:     {}",
        rig.collector.posts_to(CollectorRoute::Capture)
    );
    println!(
        "  Retained snapshot:    {}",
        store
            .read()
            .map_or("none".to_string(), |s| format!("{} bytes @ {} ms", s.len(), s.captured_at_ms()))
    );

    let check = |ok: bool, what: &str| {
        println!("  {} {}", if ok { "✓ PASS:" } else { "⚠️  FAIL:" }, what);
    };
    println!();
    check(stable_captures == 0, "no capture while the shelf was stable");
    check(restock_captures == 1, "exactly one capture on restock");
    check(
        shuffle_captures + settled_captures == 0,
        "cooldown held back the shuffle",
    );
}
