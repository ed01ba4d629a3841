//! Device HTTP endpoints that do not loop
//!
//! Transport-independent halves of `GET /` and `GET /capture`; the firmware
//! wires them into its HTTP server.

use crate::camera::FrameSource;
use crate::error::CaptureFault;
use crate::snapshot::SnapshotStore;

/// `GET /`
pub const LANDING_PAGE_HTML: &str = concat!(
    "<!doctype html><html><head><meta name='viewport' content='width=device-width,initial-scale=1'>",
    "<title>ESP32-CAM</title></head><body style='margin:0; font-family:sans-serif;'>",
    "<h3 style='padding:12px;'>ESP32-CAM Live Stream</h3>",
    "<img src='/stream' style='width:100%; max-width:720px; height:auto; display:block; padding:12px;'/>",
    "<p style='padding:12px;'>Triggered snapshot: <a href='/capture'>/capture</a></p>",
    "</body></html>",
);

/// Where a `/capture` image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// The retained triggered snapshot
    Triggered,
    /// A live frame taken for this request
    Fresh,
}

impl SnapshotSource {
    pub fn filename(&self) -> &'static str {
        match self {
            SnapshotSource::Triggered => "triggered.jpg",
            SnapshotSource::Fresh => "capture.jpg",
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("inline; filename={}", self.filename())
    }
}

/// Serve `/capture`
///
/// Prefers the retained snapshot and never stores anything itself. Without
/// one, a fresh frame is taken and written while still held, then released.
/// An error means no image could be produced (HTTP 500).
pub fn serve_capture<C, F, E>(store: &SnapshotStore, camera: &mut C, respond: F) -> Result<SnapshotSource, E>
where
    C: FrameSource,
    F: FnOnce(SnapshotSource, &[u8]) -> Result<(), E>,
    E: From<CaptureFault>,
{
    if let Some(snapshot) = store.read() {
        if !snapshot.is_empty() {
            respond(SnapshotSource::Triggered, snapshot.bytes())?;
            return Ok(SnapshotSource::Triggered);
        }
    }

    let frame = camera.acquire()?;
    respond(SnapshotSource::Fresh, &frame)?;
    Ok(SnapshotSource::Fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use crate::sim::SimCamera;

    fn collect(
        store: &SnapshotStore,
        camera: &mut SimCamera,
    ) -> Result<(SnapshotSource, Vec<u8>), CaptureFault> {
        let mut body = Vec::new();
        let source = serve_capture(store, camera, |_, bytes| {
            body = bytes.to_vec();
            Ok::<(), CaptureFault>(())
        })?;
        Ok((source, body))
    }

    #[test]
    fn test_landing_page_links_endpoints() {
        assert!(LANDING_PAGE_HTML.contains("src='/stream'"));
        assert!(LANDING_PAGE_HTML.contains("href='/capture'"));
    }

    #[test]
    fn test_prefers_retained_snapshot() {
        let store = SnapshotStore::new();
        store.store(Snapshot::new(vec![0xFF, 0xD8, 9, 0xFF, 0xD9], 5));
        let mut camera = SimCamera::new();

        let (source, body) = collect(&store, &mut camera).unwrap();
        assert_eq!(source, SnapshotSource::Triggered);
        assert_eq!(body, vec![0xFF, 0xD8, 9, 0xFF, 0xD9]);
        assert_eq!(camera.acquired(), 0);
        assert_eq!(
            source.content_disposition(),
            "inline; filename=triggered.jpg"
        );
    }

    #[test]
    fn test_falls_back_to_fresh_frame_without_storing() {
        let store = SnapshotStore::new();
        let mut camera = SimCamera::new();

        let (source, body) = collect(&store, &mut camera).unwrap();
        assert_eq!(source, SnapshotSource::Fresh);
        assert_eq!(body, camera.frame_bytes(1));
        assert_eq!(camera.in_flight(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_image_at_all_is_an_error() {
        let store = SnapshotStore::new();
        let mut camera = SimCamera::new();
        camera.fail_next(1);

        assert_eq!(
            collect(&store, &mut camera),
            Err(CaptureFault::FrameUnavailable)
        );
    }
}
