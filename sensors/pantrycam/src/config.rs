/// Configuration management for the PantryCam node
///
/// Network settings are compiled in; set them through environment variables
/// at build time. Trigger and pacing constants come from the framework.
use capture_framework::TriggerConfig;

/// Network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network to join (station mode only)
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    /// Collector service host (IP or name)
    pub collector_host: &'static str,
    pub collector_port: u16,
    /// Port of the on-device stream server
    pub http_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            // Placeholders - MUST set via environment variables
            wifi_ssid: "PantryNet",
            wifi_password: "pantry1234",
            collector_host: "192.168.1.100",
            collector_port: 5001,
            http_port: 80,
        }
    }
}

/// Master system configuration
#[derive(Debug, Clone, Default)]
pub struct SystemConfig {
    pub network: NetworkConfig,
    pub trigger: TriggerConfig,
}

impl SystemConfig {
    /// Create configuration from environment variables (compile-time)
    ///
    /// ```bash
    /// export WIFI_SSID="YourNetworkName"
    /// export WIFI_PASSWORD="YourPassword"
    /// export COLLECTOR_HOST="192.168.1.100"   # Machine running the collector
    /// export COLLECTOR_PORT="5001"
    /// cargo build --release
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ssid) = option_env!("WIFI_SSID") {
            config.network.wifi_ssid = ssid;
        }
        if let Some(password) = option_env!("WIFI_PASSWORD") {
            config.network.wifi_password = password;
        }
        if let Some(host) = option_env!("COLLECTOR_HOST") {
            config.network.collector_host = host;
        }
        if let Some(port) = option_env!("COLLECTOR_PORT").and_then(|p| p.parse().ok()) {
            config.network.collector_port = port;
        }

        config
    }
}
