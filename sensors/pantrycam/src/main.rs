mod board;
mod camera;
mod config;
mod flash_led;
mod http_server;
mod ultrasonic;
mod uplink;
mod wifi;

use board::{BootClock, RtosDelay};
use camera::EspCamera;
use capture_framework::status::{format_mac, SimulatedDrain};
use capture_framework::{CaptureScheduler, Clock, CollectorRoute, Rig, SnapshotStore, StatusReporter};
use config::SystemConfig;
use esp_idf_hal::{
    delay::FreeRtos,
    ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution},
    peripherals::Peripherals,
    prelude::*,
};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use flash_led::FlashLed;
use http_server::{CameraServer, StreamState};
use log::{error, info};
use ultrasonic::Ultrasonic;
use uplink::HttpCollector;
use wifi::WifiManager;

/// Status task wake-up interval
const STATUS_POLL_MS: u32 = 10;

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    if let Err(e) = run() {
        error!("Startup failed: {:?}", e);
        FreeRtos::delay_ms(1000);
        esp_idf_hal::reset::restart();
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemConfig::from_env();

    info!("=== PantryCam ESP32-CAM ===");
    info!(
        "SSID: {}, collector: {}:{}, threshold: {:.1} cm, cooldown: {} ms",
        config.network.wifi_ssid,
        config.network.collector_host,
        config.network.collector_port,
        config.trigger.classifier.threshold_cm,
        config.trigger.arbiter.cooldown_ms
    );

    // Initialize hardware
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    info!("Initializing ultrasonic ranger");
    let ranger = Ultrasonic::new(
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &config.trigger.sampler,
    )?;

    // Camera XCLK holds LEDC timer 0 / channel 0, the flash gets timer 1
    info!("Initializing flash LED");
    let flash_timer = LedcTimerDriver::new(
        peripherals.ledc.timer1,
        &TimerConfig::new()
            .frequency(5.kHz().into())
            .resolution(Resolution::Bits8),
    )?;
    let light = FlashLed::new(LedcDriver::new(
        peripherals.ledc.channel1,
        &flash_timer,
        peripherals.pins.gpio4,
    )?)?;

    info!("Initializing camera");
    let camera = match EspCamera::init() {
        Ok(camera) => camera,
        Err(e) => {
            error!("Camera init failed: {}", e);
            esp_idf_hal::reset::restart();
        }
    };

    info!("Connecting to WiFi: {}", config.network.wifi_ssid);
    let mut wifi = WifiManager::new(peripherals.modem, sysloop, nvs)?;
    wifi.connect(config.network.wifi_ssid, config.network.wifi_password)?;
    let device_id = format_mac(wifi.mac()?);
    let ip = wifi.ip()?;

    let uplink = HttpCollector::new(config.network.collector_host, config.network.collector_port);
    info!("Backend capture URL: {}", uplink.url(CollectorRoute::Capture));
    info!("Backend frame URL:   {}", uplink.url(CollectorRoute::Frame));
    info!("Backend status URL:  {}", uplink.url(CollectorRoute::Status));

    let store = SnapshotStore::new();
    let stream = StreamState {
        scheduler: CaptureScheduler::new(&config.trigger, store.clone()),
        rig: Rig {
            ranger,
            camera: camera.handle(),
            collector: uplink,
            light,
            delay: RtosDelay,
        },
    };
    let _server = CameraServer::start(config.network.http_port, stream, store, camera)?;
    info!("Open http://{}/ or http://{}/stream", ip, ip);

    // Liveness reports run here for the life of the device; this frame also
    // keeps the WiFi driver, flash timer and server alive
    info!("Reporting status as {}", device_id);
    let mut reporter = StatusReporter::new(config.trigger.status.clone(), device_id);
    let mut gauge = SimulatedDrain::default();
    let mut status_uplink =
        HttpCollector::new(config.network.collector_host, config.network.collector_port);

    loop {
        reporter.poll(BootClock.now_ms(), &mut gauge, &mut status_uplink);
        FreeRtos::delay_ms(STATUS_POLL_MS);
    }
}
