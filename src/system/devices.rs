//! Device Interfaces
//!
//! Abstract capabilities the controller consumes. The firmware implements
//! them on top of the actual drivers, tests implement them with mocks.
//!
//! # Units
//! - Power: signed percent, -100 (full reverse) to 100 (full forward)
//! - Tachometer: cumulative signed counts since the last reset
//! - Distances: sensor percent units, 0 (touching) to 100 (far)
//! - Beacon heading: negative is left of center, positive right, 0 means
//!   "no beacon"

use crate::system::error::Error;

/// Operating mode of the infrared sensor
///
/// The sensor answers one kind of query at a time; switching modes takes the
/// sensor a moment, so callers avoid switching needlessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrMode {
    /// Proximity measurement of whatever is in front of the sensor
    Proximity,
    /// Heading and distance of the infrared beacon
    BeaconSeek,
    /// Button codes sent by the infrared remote
    Remote,
}

/// Beacon reading as reported in seek mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeaconLocation {
    /// Heading relative to the robot's nose, 0 when no beacon is seen
    pub heading: i8,
    /// Distance to the beacon, a large negative value when none is seen
    pub distance: i8,
}

impl BeaconLocation {
    /// What the sensor reports when no beacon is in range
    pub const NOT_DETECTED: Self = Self {
        heading: 0,
        distance: -128,
    };

    /// Whether the beacon is in range, given the configured lost sentinel
    pub fn is_detected(&self, lost_distance: i8) -> bool {
        self.distance > lost_distance
    }
}

/// Buttons on the robot brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Enter,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

/// Status LED patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedPattern {
    Off,
    Green,
    Red,
    Amber,
}

/// Short sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioCue {
    /// Played every time line following (re)starts
    LineFollowingStarted,
    /// Played when an obstacle on the line is about to be grabbed
    ObstacleFound,
}

/// A tacho motor: tracks or gripper
pub trait Motor {
    /// Apply power in percent, already clamped to [-100, 100]
    fn set_power(&mut self, power: i8) -> Result<(), Error>;
    /// Cumulative rotation count since the last reset
    fn tachometer(&mut self) -> Result<i32, Error>;
    /// Zero the rotation count
    fn reset_tachometer(&mut self) -> Result<(), Error>;
    /// Remove power from the motor
    fn stop(&mut self) -> Result<(), Error>;
}

/// Infrared proximity / beacon / remote sensor
pub trait IrSensor {
    /// Switch the operating mode; a no-op if already in that mode
    fn set_mode(&mut self, mode: IrMode) -> Result<(), Error>;
    /// Proximity distance (proximity mode)
    fn read_distance(&mut self) -> Result<i8, Error>;
    /// Beacon heading and distance (beacon seek mode)
    fn read_beacon_location(&mut self) -> Result<BeaconLocation, Error>;
    /// Raw code of the remote buttons currently pressed (remote mode)
    fn read_remote_command(&mut self) -> Result<u8, Error>;
}

/// Downward facing reflected light sensor
pub trait ReflectanceSensor {
    /// Reflected light intensity, 0 (black) to 100 (white)
    fn read(&mut self) -> Result<u8, Error>;
}

/// Sound output
///
/// Playing is fire-and-forget: the call returns immediately and playback
/// problems never reach the caller.
pub trait Speaker {
    fn play(&mut self, cue: AudioCue);
}

/// Status LED
pub trait StatusIndicator {
    fn set_pattern(&mut self, pattern: LedPattern) -> Result<(), Error>;
}

/// Brick buttons
pub trait Buttons {
    /// The button pressed since the last poll, if any
    fn poll(&mut self) -> Result<Option<Button>, Error>;
}

/// Renders status snapshots, on screen or elsewhere
pub trait StatusDisplay {
    fn show(&mut self, snapshot: &crate::system::state::StatusSnapshot) -> Result<(), Error>;
}

/// Bundles the concrete device types of one hardware platform
pub trait Platform {
    type Motor: Motor;
    type IrSensor: IrSensor;
    type Reflectance: ReflectanceSensor;
    type Speaker: Speaker;
    type Status: StatusIndicator;
    type Buttons: Buttons;
    type Display: StatusDisplay;
}

/// All devices of the robot
pub struct Devices<P: Platform> {
    pub left_motor: P::Motor,
    pub right_motor: P::Motor,
    pub gripper_motor: P::Motor,
    pub ir_sensor: P::IrSensor,
    pub reflectance: P::Reflectance,
    pub speaker: P::Speaker,
    pub status: P::Status,
    pub buttons: P::Buttons,
    pub display: P::Display,
}
