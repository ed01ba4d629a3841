//! Outbound collector interface
//!
//! The collector is a plain HTTP service. The device only POSTs to it and
//! treats any 2xx as success; response bodies are never read.

use log::info;

use crate::error::NetworkFault;

/// Collector endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorRoute {
    /// Triggered snapshot (raw JPEG)
    Capture,
    /// Periodic live frame (raw JPEG)
    Frame,
    /// Liveness report (JSON)
    Status,
}

impl CollectorRoute {
    pub fn path(&self) -> &'static str {
        match self {
            CollectorRoute::Capture => "/api/capture",
            CollectorRoute::Frame => "/api/frame",
            CollectorRoute::Status => "/api/bots",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            CollectorRoute::Capture | CollectorRoute::Frame => "image/jpeg",
            CollectorRoute::Status => "application/json",
        }
    }
}

/// Full URL for a route on the collector host
pub fn collector_url(host: &str, port: u16, route: CollectorRoute) -> String {
    format!("http://{}:{}{}", host, port, route.path())
}

/// HTTP uplink to the collector
pub trait Collector {
    /// Whether the network link is currently usable
    fn link_up(&self) -> bool;

    /// POST `body` to `route`, returning the HTTP status code
    ///
    /// Must give up after `timeout_ms`.
    fn post(&mut self, route: CollectorRoute, body: &[u8], timeout_ms: u32)
        -> Result<u16, NetworkFault>;
}

/// One best-effort delivery: link check, POST, status check
///
/// Never retries. A down link fails before any I/O is attempted.
pub fn deliver<N: Collector>(
    collector: &mut N,
    route: CollectorRoute,
    body: &[u8],
    timeout_ms: u32,
) -> Result<(), NetworkFault> {
    if !collector.link_up() {
        return Err(NetworkFault::LinkDown);
    }

    let code = collector.post(route, body, timeout_ms)?;
    info!("POST {} -> HTTP {} (len={})", route.path(), code, body.len());

    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(NetworkFault::Status(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingCollector;

    #[test]
    fn test_urls() {
        assert_eq!(
            collector_url("10.0.0.5", 5001, CollectorRoute::Capture),
            "http://10.0.0.5:5001/api/capture"
        );
        assert_eq!(
            collector_url("10.0.0.5", 5001, CollectorRoute::Status),
            "http://10.0.0.5:5001/api/bots"
        );
    }

    #[test]
    fn test_link_down_fails_without_posting() {
        let mut collector = RecordingCollector::new();
        collector.set_link_up(false);

        let result = deliver(&mut collector, CollectorRoute::Frame, b"jpeg", 2500);
        assert_eq!(result, Err(NetworkFault::LinkDown));
        assert!(collector.posts().is_empty());
    }

    #[test]
    fn test_non_2xx_is_a_fault() {
        let mut collector = RecordingCollector::new();
        collector.respond_with(Ok(503));

        let result = deliver(&mut collector, CollectorRoute::Frame, b"jpeg", 2500);
        assert_eq!(result, Err(NetworkFault::Status(503)));
        assert_eq!(collector.posts().len(), 1);
    }

    #[test]
    fn test_success_records_route_and_timeout() {
        let mut collector = RecordingCollector::new();
        deliver(&mut collector, CollectorRoute::Capture, b"abc", 2500).unwrap();

        let post = &collector.posts()[0];
        assert_eq!(post.route, CollectorRoute::Capture);
        assert_eq!(post.body, b"abc");
        assert_eq!(post.timeout_ms, 2500);
    }
}
