use esp_idf_hal::peripheral;
/// WiFi connection manager (station mode)
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::info;

pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiManager {
    pub fn new(
        modem: impl peripheral::Peripheral<P = esp_idf_hal::modem::Modem> + 'static,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;
        Ok(Self { wifi })
    }

    /// Connect to an existing WiFi network
    pub fn connect(
        &mut self,
        ssid: &str,
        password: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        info!("Setting WiFi configuration (STA mode)");
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| "SSID longer than 32 bytes")?,
            password: password
                .try_into()
                .map_err(|_| "WiFi password longer than 64 bytes")?,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;

        info!("Starting WiFi");
        self.wifi.start()?;

        // Modem sleep adds hundreds of ms of latency to every stream chunk
        esp_idf_svc::sys::esp!(unsafe {
            esp_idf_svc::sys::esp_wifi_set_ps(esp_idf_svc::sys::wifi_ps_type_t_WIFI_PS_NONE)
        })?;

        info!("Connecting to AP");
        self.wifi.connect()?;

        info!("Waiting for DHCP lease");
        self.wifi.wait_netif_up()?;

        info!("WiFi connected! IP: {}", self.ip()?);
        Ok(())
    }

    pub fn ip(&self) -> Result<std::net::Ipv4Addr, esp_idf_svc::sys::EspError> {
        Ok(self.wifi.wifi().sta_netif().get_ip_info()?.ip)
    }

    /// Station MAC address, used as the device id
    pub fn mac(&self) -> Result<[u8; 6], esp_idf_svc::sys::EspError> {
        self.wifi.wifi().sta_netif().get_mac()
    }
}

/// Whether the station is associated right now
///
/// Asks the driver directly so uplink code can check the link without
/// holding the manager.
pub fn station_connected() -> bool {
    let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
    esp_idf_svc::sys::esp!(unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) })
        .is_ok()
}
