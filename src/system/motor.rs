//! Motor setpoints
//!
//! Every power value leaving a behavior passes through [`clamp_power`], so a
//! motor is never handed anything outside [-100, 100].

use crate::system::devices::{Devices, Motor, Platform};
use crate::system::error::Error;

/// Largest power magnitude a motor accepts
pub const MAX_POWER: i8 = 100;

/// Clamp a computed power to the valid motor range
///
/// Fractions are truncated toward zero, matching integer power steps.
pub fn clamp_power(power: f32) -> i8 {
    power.clamp(-(MAX_POWER as f32), MAX_POWER as f32) as i8
}

/// Power for left track, right track and gripper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSetpoint {
    pub left: i8,
    pub right: i8,
    pub gripper: i8,
}

impl MotorSetpoint {
    /// Everything at rest
    pub const STOP: Self = Self {
        left: 0,
        right: 0,
        gripper: 0,
    };

    /// Build a setpoint, clamping each channel
    pub fn new(left: i32, right: i32, gripper: i32) -> Self {
        Self {
            left: clamp_power(left as f32),
            right: clamp_power(right as f32),
            gripper: clamp_power(gripper as f32),
        }
    }

    /// Same power on both tracks, gripper idle
    pub fn straight(power: i8) -> Self {
        Self::new(power as i32, power as i32, 0)
    }

    /// Turn in place; positive power turns right
    pub fn spin(power: i8) -> Self {
        Self::new(power as i32, -(power as i32), 0)
    }

    /// Only the gripper moves
    pub fn grip(power: i8) -> Self {
        Self::new(0, 0, power as i32)
    }

    /// Tracks from floating point powers
    pub fn tracks(left: f32, right: f32) -> Self {
        Self {
            left: clamp_power(left),
            right: clamp_power(right),
            gripper: 0,
        }
    }
}

impl<P: Platform> Devices<P> {
    /// Send a setpoint to all three motors
    pub fn apply(&mut self, setpoint: MotorSetpoint) -> Result<(), Error> {
        self.left_motor.set_power(setpoint.left)?;
        self.right_motor.set_power(setpoint.right)?;
        self.gripper_motor.set_power(setpoint.gripper)
    }

    /// Stop all three motors
    pub fn stop_motors(&mut self) -> Result<(), Error> {
        self.left_motor.stop()?;
        self.right_motor.stop()?;
        self.gripper_motor.stop()
    }

    /// Zero all three tachometers
    pub fn reset_tachometers(&mut self) -> Result<(), Error> {
        self.left_motor.reset_tachometer()?;
        self.right_motor.reset_tachometer()?;
        self.gripper_motor.reset_tachometer()
    }
}
