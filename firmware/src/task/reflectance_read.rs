//! Reflected light sampling
//!
//! Samples the light sensor every 10 ms, well above the 50 ms line following
//! period, so the controller always finds a fresh value.
//!
//! # Calibration
//! ```text
//! intensity = (raw - BLACK_RAW) * 100 / (WHITE_RAW - BLACK_RAW)
//! ```
//! clamped to 0..=100. The raw bounds are the median readings over black
//! tape and over the white mat.

use embassy_rp::adc::Channel;
use embassy_rp::gpio::Pull;
use embassy_time::{Duration, Ticker};
use moving_median::MovingMedian;

use crate::driver::reflectance;
use crate::system::resources::{get_adc, ReflectanceResources};

const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Raw reading over black tape
const BLACK_RAW: f32 = 350.0;

/// Raw reading over the white mat
const WHITE_RAW: f32 = 3300.0;

/// Short window, a longer one would lag behind the line edge
const MEDIAN_WINDOW_SIZE: usize = 5;

#[embassy_executor::task]
pub async fn reflectance_read(r: ReflectanceResources) {
    let mut channel = Channel::new_pin(r.sensor_pin, Pull::None);
    let mut median_filter = MovingMedian::<f32, MEDIAN_WINDOW_SIZE>::new();
    let mut ticker = Ticker::every(SAMPLE_INTERVAL);

    loop {
        let raw = {
            let mut adc_guard = get_adc().lock().await;
            match adc_guard.as_mut() {
                Some(adc) => adc.read(&mut channel).await.ok(),
                None => None,
            }
        };

        if let Some(raw) = raw {
            median_filter.add_value(f32::from(raw));
            reflectance::publish(intensity(median_filter.median()));
        }

        ticker.next().await;
    }
}

fn intensity(raw: f32) -> u8 {
    let scaled = (raw - BLACK_RAW) * 100.0 / (WHITE_RAW - BLACK_RAW);
    scaled.clamp(0.0, 100.0) as u8
}
