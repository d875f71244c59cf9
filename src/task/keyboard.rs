//! Keyboard Task
//!
//! Polls the robot buttons. Escape ends the mission: the scheduler is asked to
//! stop, the LED goes dark and every motor loses power. Down zeroes the
//! tachometers. Other buttons are ignored while a mission runs.

use embassy_time::{Duration, Instant};

use crate::system::devices::{Button, Buttons, LedPattern, Platform, StatusIndicator};
use crate::system::error::Error;
use crate::system::robot::Robot;
use crate::task::scheduler::PeriodicTask;

pub struct Keyboard {
    period: Duration,
}

impl Keyboard {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl<P: Platform> PeriodicTask<P> for Keyboard {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn run(&mut self, robot: &mut Robot<P>, _now: Instant) -> Result<(), Error> {
        match robot.devices.buttons.poll()? {
            Some(Button::Escape) => {
                info!("escape pressed, stopping");
                robot.state.request_stop();
                robot.devices.status.set_pattern(LedPattern::Off)?;
                robot.devices.stop_motors()?;
            }
            Some(Button::Down) => {
                debug!("resetting tachometers");
                robot.devices.reset_tachometers()?;
            }
            _ => {}
        }
        Ok(())
    }
}
