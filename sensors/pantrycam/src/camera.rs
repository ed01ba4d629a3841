//! OV2640 camera through the esp32-camera driver
//!
//! The driver owns a small pool of frame buffers in PSRAM. Every handle
//! borrows at most one of them at a time through [`EspFrame`], which hands
//! it back on drop, so the pool must hold one buffer per [`EspCamera`]
//! handle in use.

use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

use capture_framework::{CaptureFault, FrameSource};
use esp_idf_svc::sys::{camera, esp, EspError};
use log::info;

// AI-Thinker ESP32-CAM pin map
const PWDN_GPIO: i32 = 32;
const RESET_GPIO: i32 = -1;
const XCLK_GPIO: i32 = 0;
const SIOD_GPIO: i32 = 26;
const SIOC_GPIO: i32 = 27;
const Y9_GPIO: i32 = 35;
const Y8_GPIO: i32 = 34;
const Y7_GPIO: i32 = 39;
const Y6_GPIO: i32 = 36;
const Y5_GPIO: i32 = 21;
const Y4_GPIO: i32 = 19;
const Y3_GPIO: i32 = 18;
const Y2_GPIO: i32 = 5;
const VSYNC_GPIO: i32 = 25;
const HREF_GPIO: i32 = 23;
const PCLK_GPIO: i32 = 22;

/// Frame buffers in the driver pool: the stream loop and `/capture`
const FRAME_BUFFERS: usize = 2;

/// Handle on the initialised camera driver
pub struct EspCamera {
    _driver: (),
}

impl EspCamera {
    /// Initialise the sensor: VGA JPEG at quality 12, newest frame first
    ///
    /// Uses LEDC timer 0 / channel 0 for XCLK; keep other PWM users off them.
    pub fn init() -> Result<Self, EspError> {
        let config = camera::camera_config_t {
            pin_pwdn: PWDN_GPIO,
            pin_reset: RESET_GPIO,
            pin_xclk: XCLK_GPIO,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: SIOD_GPIO,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: SIOC_GPIO,
            },
            pin_d7: Y9_GPIO,
            pin_d6: Y8_GPIO,
            pin_d5: Y7_GPIO,
            pin_d4: Y6_GPIO,
            pin_d3: Y5_GPIO,
            pin_d2: Y4_GPIO,
            pin_d1: Y3_GPIO,
            pin_d0: Y2_GPIO,
            pin_vsync: VSYNC_GPIO,
            pin_href: HREF_GPIO,
            pin_pclk: PCLK_GPIO,
            xclk_freq_hz: 20_000_000,
            ledc_timer: camera::ledc_timer_t_LEDC_TIMER_0,
            ledc_channel: camera::ledc_channel_t_LEDC_CHANNEL_0,
            pixel_format: camera::pixformat_t_PIXFORMAT_JPEG,
            // Larger frames make every collector POST slower
            frame_size: camera::framesize_t_FRAMESIZE_VGA,
            jpeg_quality: 12,
            fb_count: FRAME_BUFFERS,
            fb_location: camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
            grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
            ..Default::default()
        };

        esp!(unsafe { camera::esp_camera_init(&config) })?;
        info!("Camera init OK ({} frame buffers)", FRAME_BUFFERS);
        Ok(Self { _driver: () })
    }

    /// A second handle for another consumer of the same driver
    pub fn handle(&self) -> Self {
        Self { _driver: () }
    }
}

/// One borrowed frame buffer
pub struct EspFrame<'a> {
    fb: NonNull<camera::camera_fb_t>,
    _camera: PhantomData<&'a mut EspCamera>,
}

impl Deref for EspFrame<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // The driver keeps buf/len valid until the buffer is returned
        unsafe {
            let fb = self.fb.as_ref();
            core::slice::from_raw_parts(fb.buf, fb.len)
        }
    }
}

impl Drop for EspFrame<'_> {
    fn drop(&mut self) {
        unsafe { camera::esp_camera_fb_return(self.fb.as_ptr()) };
    }
}

impl FrameSource for EspCamera {
    type Frame<'a> = EspFrame<'a>;

    fn acquire(&mut self) -> Result<EspFrame<'_>, CaptureFault> {
        let fb = NonNull::new(unsafe { camera::esp_camera_fb_get() })
            .ok_or(CaptureFault::FrameUnavailable)?;
        Ok(EspFrame {
            fb,
            _camera: PhantomData,
        })
    }
}
