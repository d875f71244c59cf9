//! Error types
//!
//! Interface faults are not retried: the failing task returns the error, the
//! scheduler stops and the mission powers the robot off. Sensor readings that
//! merely report "nothing detected" are not errors and never show up here.

use thiserror::Error;

/// Identifies the collaborator that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    LeftMotor,
    RightMotor,
    GripperMotor,
    IrSensor,
    ReflectanceSensor,
    StatusIndicator,
    Buttons,
    Display,
}

/// Errors raised by the mission controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A device interface reported a fault
    #[error("device failure: {0:?}")]
    Device(DeviceKind),
    /// More tasks were registered than the scheduler has slots for
    #[error("scheduler has no free task slot")]
    SchedulerFull,
    /// The scheduler was started without any task
    #[error("scheduler has no tasks to run")]
    NoTasks,
    /// Steering ranges are empty, unordered or overlapping
    #[error("steering lookup table is invalid")]
    InvalidSteeringTable,
    /// A calibration value is out of its meaningful range
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
