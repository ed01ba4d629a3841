/// HC-SR04 on the ESP32-CAM's free GPIOs (trigger GPIO14, echo GPIO15)
use capture_framework::sampler::{RangeProbe, SamplerConfig};
use capture_framework::SensorFault;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, InputPin, Output, OutputPin, PinDriver};
use esp_idf_svc::sys::EspError;
use hcsr04::{EchoError, EchoPins, RangeBand};
use log::warn;

pub struct Ultrasonic {
    trigger: PinDriver<'static, AnyOutputPin, Output>,
    echo: PinDriver<'static, AnyInputPin, Input>,
    band: RangeBand,
}

impl Ultrasonic {
    pub fn new(
        trigger: impl OutputPin,
        echo: impl InputPin,
        sampler: &SamplerConfig,
    ) -> Result<Self, EspError> {
        let mut trigger = PinDriver::output(trigger.downgrade_output())?;
        trigger.set_low()?;
        let echo = PinDriver::input(echo.downgrade_input())?;

        Ok(Self {
            trigger,
            echo,
            band: RangeBand::new(sampler.min_cm, sampler.max_cm),
        })
    }
}

impl EchoPins for Ultrasonic {
    fn set_trigger(&mut self, high: bool) {
        let result = if high {
            self.trigger.set_high()
        } else {
            self.trigger.set_low()
        };
        if let Err(e) = result {
            warn!("Trigger pin write failed: {}", e);
        }
    }

    fn echo_is_high(&mut self) -> bool {
        self.echo.is_high()
    }

    fn now_us(&mut self) -> u64 {
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
    }

    fn delay_us(&mut self, us: u32) {
        Ets::delay_us(us);
    }
}

impl RangeProbe for Ultrasonic {
    fn probe(&mut self, timeout_us: u32) -> Result<f32, SensorFault> {
        let band = self.band;
        hcsr04::ping_in_band(self, timeout_us, band).map_err(|e| match e {
            EchoError::Timeout => SensorFault::Timeout,
            EchoError::OutOfRange(cm) => SensorFault::OutOfRange(cm),
        })
    }
}
