//! Two color status LED
//!
//! Red and green share one PWM slice, one per output channel. Amber is both
//! at once.

use embassy_rp::pwm::{self, Pwm};
use gripper_rover::system::devices::{LedPattern, StatusIndicator};
use gripper_rover::system::error::Error;

use crate::system::resources::StatusLedResources;

pub struct StatusLed {
    pwm: Pwm<'static>,
    config: pwm::Config,
    pattern: LedPattern,
}

impl StatusLed {
    pub fn new(r: StatusLedResources) -> Self {
        // 100Hz is plenty for an indicator
        let desired_freq_hz = 100;
        let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
        let divider = ((clock_freq_hz / desired_freq_hz) / 65535 + 1) as u8;
        let period = (clock_freq_hz / (desired_freq_hz * divider as u32)) as u16 - 1;

        let mut config = pwm::Config::default();
        config.divider = divider.into();
        config.top = period;
        config.compare_a = 0;
        config.compare_b = 0;
        let pwm = Pwm::new_output_ab(r.pwm_slice, r.red_pin, r.green_pin, config.clone());

        Self {
            pwm,
            config,
            pattern: LedPattern::Off,
        }
    }
}

impl StatusIndicator for StatusLed {
    fn set_pattern(&mut self, pattern: LedPattern) -> Result<(), Error> {
        if pattern == self.pattern {
            return Ok(());
        }
        let (red, green) = match pattern {
            LedPattern::Off => (false, false),
            LedPattern::Green => (false, true),
            LedPattern::Red => (true, false),
            LedPattern::Amber => (true, true),
        };
        // a compare value above top keeps the output high for the whole period
        let full = self.config.top.saturating_add(1);
        let level = |on: bool| if on { full } else { 0 };
        self.config.compare_a = level(red);
        self.config.compare_b = level(green);
        self.pwm.set_config(&self.config);
        self.pattern = pattern;
        Ok(())
    }
}
