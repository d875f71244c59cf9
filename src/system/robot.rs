//! Shared mission context
//!
//! The scheduler passes one `Robot` by mutable reference to every task
//! action: devices to act on, state to read and update.

use crate::mission::Behavior;
use crate::system::devices::{Devices, Motor, Platform};
use crate::system::error::Error;
use crate::system::state::{RobotState, StatusSnapshot};

/// Devices plus shared state
pub struct Robot<P: Platform> {
    pub devices: Devices<P>,
    pub state: RobotState,
}

impl<P: Platform> Robot<P> {
    pub fn new(devices: Devices<P>) -> Self {
        Self {
            devices,
            state: RobotState::default(),
        }
    }

    /// Collect a read-only status snapshot
    ///
    /// Reads the three tachometers; sensor values come from the cache the
    /// behaviors maintain, so the infrared sensor mode is left alone.
    pub fn snapshot(&mut self, behavior: Behavior) -> Result<StatusSnapshot, Error> {
        Ok(StatusSnapshot {
            behavior,
            left_tachometer: self.devices.left_motor.tachometer()?,
            right_tachometer: self.devices.right_motor.tachometer()?,
            gripper_tachometer: self.devices.gripper_motor.tachometer()?,
            direction: self.state.direction,
            setpoint: self.state.setpoint,
            sensors: self.state.sensors,
            garbage_collection: self.state.garbage_collection,
            line_following: self.state.line_following,
        })
    }
}
