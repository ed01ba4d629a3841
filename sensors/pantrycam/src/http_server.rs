use std::sync::{Arc, Mutex, MutexGuard};

/// On-device HTTP server: landing page, live MJPEG stream, snapshot fetch
///
/// The stream handler runs the whole capture loop for as long as its client
/// stays connected.
use capture_framework::endpoints::{serve_capture, LANDING_PAGE_HTML};
use capture_framework::stream::STREAM_CONTENT_TYPE;
use capture_framework::{CaptureFault, CaptureScheduler, FrameSink, Rig, SnapshotStore, StreamFault};
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::io::{EspIOError, Write};
use log::info;

use crate::board::{BootClock, RtosDelay};
use crate::camera::EspCamera;
use crate::flash_led::FlashLed;
use crate::ultrasonic::Ultrasonic;
use crate::uplink::HttpCollector;

pub type StationRig = Rig<Ultrasonic, EspCamera, HttpCollector, FlashLed, RtosDelay>;

/// Everything one stream client's loop needs
pub struct StreamState {
    pub scheduler: CaptureScheduler,
    pub rig: StationRig,
}

#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error("no image available: {0}")]
    Capture(#[from] CaptureFault),
    #[error("response write failed: {0:?}")]
    Io(#[from] EspIOError),
}

/// Chunked response body as a stream sink
struct ResponseSink<W>(W);

impl<W: Write> FrameSink for ResponseSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StreamFault> {
        self.0
            .write_all(chunk)
            .map_err(|_| StreamFault::Disconnected)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct CameraServer {
    _server: EspHttpServer<'static>,
}

impl CameraServer {
    /// Create and start the server
    ///
    /// # Arguments
    /// * `port` - HTTP port to listen on
    /// * `stream` - Scheduler and hardware for the `/stream` loop
    /// * `store` - Retained snapshot shared with the scheduler
    /// * `camera` - Camera handle for fresh `/capture` frames
    pub fn start(
        port: u16,
        stream: StreamState,
        store: Arc<SnapshotStore>,
        camera: EspCamera,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Starting camera server on port {}", port);

        let server_config = Configuration {
            http_port: port,
            max_uri_handlers: 4,
            stack_size: 10240,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&server_config)?;

        server.fn_handler(
            "/",
            esp_idf_svc::http::Method::Get,
            |req| -> Result<(), EspIOError> {
                let html_bytes = LANDING_PAGE_HTML.as_bytes();
                let content_length = html_bytes.len().to_string();
                let mut response = req.into_response(
                    200,
                    None,
                    &[
                        ("Content-Type", "text/html"),
                        ("Content-Length", &content_length),
                    ],
                )?;
                response.write_all(html_bytes)?;
                Ok(())
            },
        )?;

        // Retained snapshot if there is one, else a fresh frame; an error
        // here becomes a 500
        let capture_camera = Mutex::new(camera);
        server.fn_handler(
            "/capture",
            esp_idf_svc::http::Method::Get,
            move |req| -> Result<(), HandlerError> {
                let mut camera = lock(&capture_camera);
                serve_capture(&store, &mut *camera, |source, bytes| -> Result<(), HandlerError> {
                    let disposition = source.content_disposition();
                    let mut response = req.into_response(
                        200,
                        None,
                        &[
                            ("Content-Type", "image/jpeg"),
                            ("Content-Disposition", &disposition),
                        ],
                    )?;
                    response.write_all(bytes)?;
                    Ok(())
                })?;
                Ok(())
            },
        )?;

        let stream = Mutex::new(stream);
        server.fn_handler(
            "/stream",
            esp_idf_svc::http::Method::Get,
            move |req| -> Result<(), EspIOError> {
                let response = req.into_response(
                    200,
                    None,
                    &[
                        ("Content-Type", STREAM_CONTENT_TYPE),
                        ("Access-Control-Allow-Origin", "*"),
                    ],
                )?;
                let mut sink = ResponseSink(response);

                let mut state = lock(&stream);
                let StreamState { scheduler, rig } = &mut *state;
                scheduler.serve(&BootClock, rig, &mut sink);
                Ok(())
            },
        )?;

        info!("Camera server ready");
        Ok(Self { _server: server })
    }
}
