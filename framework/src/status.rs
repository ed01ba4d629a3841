//! Liveness reporting
//!
//! Independent of the stream loop: the firmware runs [`StatusReporter::poll`]
//! from its own task so status keeps flowing while nobody watches the stream.

use log::{info, warn};
use serde::{Serialize, Serializer};

use crate::collector::{deliver, Collector, CollectorRoute};
use crate::error::NetworkFault;
use crate::timing::period_elapsed;

/// Body of `POST /api/bots`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Station MAC, `AA:BB:CC:DD:EE:FF`
    pub id: String,
    pub status: String,
    /// Charge in percent, sent as a two-decimal string
    #[serde(serialize_with = "two_decimals")]
    pub battery: f32,
}

fn two_decimals<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{:.2}", value))
}

impl StatusReport {
    pub fn to_json(&self) -> Vec<u8> {
        // Plain strings and a preformatted number; serialization cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Remaining charge source
pub trait BatteryGauge {
    /// Percent, 0.0 to 100.0
    fn percent(&mut self, now_ms: u32) -> f32;
}

/// Stand-in gauge for boards without a fuel gauge: drains linearly from 100 %
/// to 0 % over `cycle_ms`, then starts over
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDrain {
    pub cycle_ms: u32,
}

impl Default for SimulatedDrain {
    fn default() -> Self {
        Self { cycle_ms: 600_000 } // 10 minutes
    }
}

impl BatteryGauge for SimulatedDrain {
    fn percent(&mut self, now_ms: u32) -> f32 {
        if self.cycle_ms == 0 {
            return 100.0;
        }
        let phase = (now_ms % self.cycle_ms) as f32 / self.cycle_ms as f32;
        (1.0 - phase) * 100.0
    }
}

#[derive(Debug, Clone)]
pub struct StatusConfig {
    pub period_ms: u32,
    pub timeout_ms: u32,
    /// Value of the `status` field
    pub status: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            period_ms: 3000,
            timeout_ms: 2000,
            status: "Connected".to_string(),
        }
    }
}

pub struct StatusReporter {
    config: StatusConfig,
    device_id: String,
    last_report_ms: Option<u32>,
}

impl StatusReporter {
    pub fn new(config: StatusConfig, device_id: impl Into<String>) -> Self {
        Self {
            config,
            device_id: device_id.into(),
            last_report_ms: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn report<G: BatteryGauge>(&self, now_ms: u32, gauge: &mut G) -> StatusReport {
        StatusReport {
            id: self.device_id.clone(),
            status: self.config.status.clone(),
            battery: gauge.percent(now_ms),
        }
    }

    /// Send a report if one is due
    ///
    /// Returns `None` when the period has not elapsed yet. The first call
    /// always reports.
    pub fn poll<G: BatteryGauge, N: Collector>(
        &mut self,
        now_ms: u32,
        gauge: &mut G,
        collector: &mut N,
    ) -> Option<Result<(), NetworkFault>> {
        if !period_elapsed(now_ms, self.last_report_ms, self.config.period_ms) {
            return None;
        }
        self.last_report_ms = Some(now_ms);

        let report = self.report(now_ms, gauge);
        let body = report.to_json();
        let result = deliver(collector, CollectorRoute::Status, &body, self.config.timeout_ms);
        match &result {
            Ok(()) => info!("Status: {} battery={:.2}", report.status, report.battery),
            Err(e) => warn!("Status report dropped: {}", e),
        }
        Some(result)
    }
}

/// Format a MAC address as `AA:BB:CC:DD:EE:FF`
pub fn format_mac(mac: [u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
