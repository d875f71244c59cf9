//! Test doubles for the device interfaces
//!
//! Motors integrate their power into the tachometer when the test advances
//! the simulation, which is enough to drive the tachometer based state
//! transitions.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::system::devices::{
    AudioCue, BeaconLocation, Button, Buttons, Devices, IrMode, IrSensor, LedPattern, Motor,
    Platform, ReflectanceSensor, Speaker, StatusDisplay, StatusIndicator,
};
use crate::system::error::{DeviceKind, Error};
use crate::system::robot::Robot;
use crate::system::state::StatusSnapshot;

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Motor = MockMotor;
    type IrSensor = MockIrSensor;
    type Reflectance = MockReflectance;
    type Speaker = MockSpeaker;
    type Status = MockStatus;
    type Buttons = MockButtons;
    type Display = MockDisplay;
}

#[derive(Debug)]
pub struct MockMotor {
    pub kind: DeviceKind,
    pub power: i8,
    pub tachometer: i32,
    pub stopped: bool,
    pub resets: u32,
    pub fail: bool,
}

impl MockMotor {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            power: 0,
            tachometer: 0,
            stopped: false,
            resets: 0,
            fail: false,
        }
    }

    /// One period of motion: tachometer moves by the applied power
    pub fn advance(&mut self) {
        self.tachometer += self.power as i32;
    }
}

impl Motor for MockMotor {
    fn set_power(&mut self, power: i8) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Device(self.kind));
        }
        assert!((-100..=100).contains(&power));
        self.power = power;
        self.stopped = false;
        Ok(())
    }

    fn tachometer(&mut self) -> Result<i32, Error> {
        Ok(self.tachometer)
    }

    fn reset_tachometer(&mut self) -> Result<(), Error> {
        self.tachometer = 0;
        self.resets += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.power = 0;
        self.stopped = true;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockIrSensor {
    pub mode: IrMode,
    pub distance: i8,
    pub beacon: BeaconLocation,
    pub remote: u8,
    pub mode_switches: u32,
    /// Reads issued while the sensor was in another mode
    pub wrong_mode_reads: u32,
    /// Sensor calls after a mode switch before data of the new mode arrives;
    /// reads in between report nothing detected
    pub switch_latency: u32,
    pending_switch: u32,
    pub fail: bool,
}

impl Default for MockIrSensor {
    fn default() -> Self {
        Self {
            mode: IrMode::Proximity,
            distance: 100,
            beacon: BeaconLocation::NOT_DETECTED,
            remote: 0,
            mode_switches: 0,
            wrong_mode_reads: 0,
            switch_latency: 0,
            pending_switch: 0,
            fail: false,
        }
    }
}

impl MockIrSensor {
    /// Whether the read gets data of the current mode
    fn check(&mut self, expected: IrMode) -> Result<bool, Error> {
        if self.fail {
            return Err(Error::Device(DeviceKind::IrSensor));
        }
        if self.pending_switch > 0 {
            self.pending_switch -= 1;
            return Ok(false);
        }
        if self.mode != expected {
            self.wrong_mode_reads += 1;
        }
        Ok(true)
    }
}

impl IrSensor for MockIrSensor {
    fn set_mode(&mut self, mode: IrMode) -> Result<(), Error> {
        if self.mode != mode {
            self.mode = mode;
            self.mode_switches += 1;
            self.pending_switch = self.switch_latency;
        } else {
            self.pending_switch = self.pending_switch.saturating_sub(1);
        }
        Ok(())
    }

    fn read_distance(&mut self) -> Result<i8, Error> {
        let fresh = self.check(IrMode::Proximity)?;
        Ok(if fresh { self.distance } else { 100 })
    }

    fn read_beacon_location(&mut self) -> Result<BeaconLocation, Error> {
        let fresh = self.check(IrMode::BeaconSeek)?;
        Ok(if fresh {
            self.beacon
        } else {
            BeaconLocation::NOT_DETECTED
        })
    }

    fn read_remote_command(&mut self) -> Result<u8, Error> {
        let fresh = self.check(IrMode::Remote)?;
        Ok(if fresh { self.remote } else { 0 })
    }
}

#[derive(Debug)]
pub struct MockReflectance {
    pub value: u8,
}

impl Default for MockReflectance {
    fn default() -> Self {
        Self { value: 40 }
    }
}

impl ReflectanceSensor for MockReflectance {
    fn read(&mut self) -> Result<u8, Error> {
        Ok(self.value)
    }
}

#[derive(Debug, Default)]
pub struct MockSpeaker {
    pub cues: Vec<AudioCue>,
}

impl Speaker for MockSpeaker {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

#[derive(Debug)]
pub struct MockStatus {
    pub pattern: LedPattern,
}

impl Default for MockStatus {
    fn default() -> Self {
        Self {
            pattern: LedPattern::Off,
        }
    }
}

impl StatusIndicator for MockStatus {
    fn set_pattern(&mut self, pattern: LedPattern) -> Result<(), Error> {
        self.pattern = pattern;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockButtons {
    pub pending: VecDeque<Option<Button>>,
}

impl Buttons for MockButtons {
    fn poll(&mut self) -> Result<Option<Button>, Error> {
        Ok(self.pending.pop_front().flatten())
    }
}

#[derive(Debug, Default)]
pub struct MockDisplay {
    pub shown: Vec<StatusSnapshot>,
}

impl StatusDisplay for MockDisplay {
    fn show(&mut self, snapshot: &StatusSnapshot) -> Result<(), Error> {
        self.shown.push(*snapshot);
        Ok(())
    }
}

/// A robot made of fresh mocks
pub fn robot() -> Robot<MockPlatform> {
    Robot::new(Devices {
        left_motor: MockMotor::new(DeviceKind::LeftMotor),
        right_motor: MockMotor::new(DeviceKind::RightMotor),
        gripper_motor: MockMotor::new(DeviceKind::GripperMotor),
        ir_sensor: MockIrSensor::default(),
        reflectance: MockReflectance::default(),
        speaker: MockSpeaker::default(),
        status: MockStatus::default(),
        buttons: MockButtons::default(),
        display: MockDisplay::default(),
    })
}

/// Integrate one period of motion into every motor tachometer
pub fn advance_motors(robot: &mut Robot<MockPlatform>) {
    robot.devices.left_motor.advance();
    robot.devices.right_motor.advance();
    robot.devices.gripper_motor.advance();
}
