/// On-board flash LED (GPIO4) driven by LEDC PWM as the status indicator
use capture_framework::Indicator;
use esp_idf_hal::ledc::LedcDriver;
use log::warn;

pub struct FlashLed {
    pwm: LedcDriver<'static>,
}

impl FlashLed {
    /// Wrap a configured channel; its timer must run at 8-bit resolution so
    /// duty maps 0..=255 directly
    pub fn new(mut pwm: LedcDriver<'static>) -> Result<Self, esp_idf_svc::sys::EspError> {
        pwm.set_duty(0)?;
        pwm.enable()?;
        Ok(Self { pwm })
    }
}

impl Indicator for FlashLed {
    fn set_duty(&mut self, duty: u8) {
        let duty = (duty as u32).min(self.pwm.get_max_duty());
        if let Err(e) = self.pwm.set_duty(duty) {
            warn!("Flash LED duty write failed: {}", e);
        }
    }
}
