/// HTTP uplink to the collector service
///
/// One short-lived connection per POST, like the collector expects; the
/// response body is never read.
use core::time::Duration;

use capture_framework::collector::collector_url;
use capture_framework::{Collector, CollectorRoute, NetworkFault};
use embedded_svc::http::client::Client;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::io::Write;

use crate::wifi;

pub struct HttpCollector {
    host: &'static str,
    port: u16,
}

impl HttpCollector {
    pub fn new(host: &'static str, port: u16) -> Self {
        Self { host, port }
    }

    pub fn url(&self, route: CollectorRoute) -> String {
        collector_url(self.host, self.port, route)
    }
}

impl Collector for HttpCollector {
    fn link_up(&self) -> bool {
        wifi::station_connected()
    }

    fn post(
        &mut self,
        route: CollectorRoute,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<u16, NetworkFault> {
        let url = self.url(route);
        let connection = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(Duration::from_millis(timeout_ms as u64)),
            ..Default::default()
        })
        .map_err(transport)?;
        let mut client = Client::wrap(connection);

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", route.content_type()),
            ("Content-Length", content_length.as_str()),
        ];

        let mut request = client.post(&url, &headers).map_err(transport)?;
        request.write_all(body).map_err(transport)?;
        request.flush().map_err(transport)?;
        let response = request.submit().map_err(transport)?;
        Ok(response.status())
    }
}

fn transport(e: impl core::fmt::Debug) -> NetworkFault {
    NetworkFault::Transport(format!("{:?}", e))
}
