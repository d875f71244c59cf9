//! Robot State
//!
//! Shared data read and written by the mission tasks. The scheduler runs one
//! task action at a time, so no locking is involved. A task can only rely on
//! what other tasks wrote before it in the same pass or in earlier passes.
//!
//! # Field Ownership
//! Each field has exactly one writer:
//! - `direction`: remote decode task
//! - `setpoint`, `sensors`: the behavior task currently driving the motors
//! - `garbage_collection`: garbage collection task
//! - `line_following`: line following task
//! - stop request: keyboard task (through [`RobotState::request_stop`])

use crate::mission::Behavior;
use crate::system::devices::BeaconLocation;
use crate::system::motor::MotorSetpoint;

/// Last intent decoded from the infrared remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Stop,
    Forward,
    TurnLeft,
    TurnRight,
    Backward,
    GripUp,
    GripDown,
    BeaconSeek,
}

impl Direction {
    /// Decode a raw remote button code
    ///
    /// Unknown codes, including button combinations, mean stop.
    pub fn from_remote_code(code: u8) -> Self {
        match code {
            0 => Direction::Stop,
            1 => Direction::TurnLeft,
            2 => Direction::GripUp,
            3 => Direction::TurnRight,
            4 => Direction::GripDown,
            5 => Direction::Forward,
            8 => Direction::Backward,
            9 => Direction::BeaconSeek,
            _ => Direction::Stop,
        }
    }
}

/// Garbage collection mission states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GarbageCollectionState {
    #[default]
    Starting,
    SearchingNextTarget,
    DrivingTowardNextTarget,
    CollectingTarget,
    SearchingBeacon,
    DrivingTowardBeacon,
    DeliveringTarget,
    /// Terminal: quota reached, nothing moves anymore
    Stop,
}

/// Line following mission states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineFollowingState {
    #[default]
    Starting,
    LineFollowing,
    GrabbingObstacle,
    Rotating,
    Advancing,
    DeliveringObstacle,
    Retracting,
    CounterRotating,
}

/// Progress of the garbage collection mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GarbageCollectionStatus {
    pub state: GarbageCollectionState,
    pub objects_collected: u8,
    pub objects_to_collect: u8,
}

/// Progress of the line following mission
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineFollowingStatus {
    pub state: LineFollowingState,
    /// Steering correction applied in the last period
    pub steering: f32,
    /// Obstacles carried off the line so far
    pub obstacles_cleared: u16,
}

/// Most recent sensor readings taken by the active behavior
///
/// Cached so that status reporting never has to touch the infrared sensor
/// and switch its mode behind a behavior's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    pub target_distance: Option<i8>,
    pub beacon: Option<BeaconLocation>,
    pub reflection: Option<u8>,
}

/// Shared robot state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotState {
    pub direction: Direction,
    pub setpoint: MotorSetpoint,
    pub sensors: SensorSnapshot,
    pub garbage_collection: GarbageCollectionStatus,
    pub line_following: LineFollowingStatus,
    stop_requested: bool,
}

impl RobotState {
    /// Ask the scheduler to stop after the current pass
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

/// Read-only status handed to the display
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub behavior: Behavior,
    pub left_tachometer: i32,
    pub right_tachometer: i32,
    pub gripper_tachometer: i32,
    pub direction: Direction,
    pub setpoint: MotorSetpoint,
    pub sensors: SensorSnapshot,
    pub garbage_collection: GarbageCollectionStatus,
    pub line_following: LineFollowingStatus,
}
