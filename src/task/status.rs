//! Status Task
//!
//! Hands a snapshot of the robot to the status display. Sensor values come
//! from the cache kept by the active behavior; the infrared sensor itself is
//! never read here, so its mode stays whatever the behavior set.

use embassy_time::{Duration, Instant};

use crate::mission::Behavior;
use crate::system::devices::{Platform, StatusDisplay};
use crate::system::error::Error;
use crate::system::robot::Robot;
use crate::task::scheduler::PeriodicTask;

pub struct Status {
    behavior: Behavior,
    period: Duration,
}

impl Status {
    pub fn new(behavior: Behavior, period: Duration) -> Self {
        Self { behavior, period }
    }
}

impl<P: Platform> PeriodicTask<P> for Status {
    fn name(&self) -> &'static str {
        "status"
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn run(&mut self, robot: &mut Robot<P>, _now: Instant) -> Result<(), Error> {
        let snapshot = robot.snapshot(self.behavior)?;
        robot.devices.display.show(&snapshot)
    }
}
