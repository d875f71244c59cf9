//! Remote Drive Task
//!
//! Turns the decoded remote [`Direction`] into motor powers and a status LED
//! pattern. The setpoint is recomputed and applied every period, so an
//! unchanged direction keeps producing the same output.

use embassy_time::{Duration, Instant};

use crate::system::config::RemoteConfig;
use crate::system::devices::{LedPattern, Platform, StatusIndicator};
use crate::system::error::Error;
use crate::system::motor::MotorSetpoint;
use crate::system::robot::Robot;
use crate::system::state::Direction;
use crate::task::scheduler::PeriodicTask;

pub struct RemoteDrive {
    config: RemoteConfig,
}

impl RemoteDrive {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Motor powers for a remote direction
    pub fn setpoint(&self, direction: Direction) -> MotorSetpoint {
        let c = &self.config;
        match direction {
            Direction::Forward => MotorSetpoint::straight(c.forward_power),
            Direction::Backward => MotorSetpoint::straight(-c.backward_power),
            Direction::TurnLeft => MotorSetpoint::spin(-c.turn_power),
            Direction::TurnRight => MotorSetpoint::spin(c.turn_power),
            Direction::GripUp => MotorSetpoint::grip(c.gripper_power),
            Direction::GripDown => MotorSetpoint::grip(-c.gripper_power),
            Direction::Stop | Direction::BeaconSeek => MotorSetpoint::STOP,
        }
    }
}

/// LED pattern shown for a remote direction
pub fn led_pattern(direction: Direction) -> LedPattern {
    match direction {
        Direction::Stop => LedPattern::Amber,
        Direction::BeaconSeek => LedPattern::Red,
        _ => LedPattern::Green,
    }
}

impl<P: Platform> PeriodicTask<P> for RemoteDrive {
    fn name(&self) -> &'static str {
        "remote drive"
    }

    fn period(&self) -> Duration {
        self.config.drive_period
    }

    fn run(&mut self, robot: &mut Robot<P>, _now: Instant) -> Result<(), Error> {
        let direction = robot.state.direction;
        let setpoint = self.setpoint(direction);

        robot.devices.apply(setpoint)?;
        robot.devices.status.set_pattern(led_pattern(direction))?;
        robot.state.setpoint = setpoint;
        Ok(())
    }
}
