//! Gripper rover mission controller
//!
//! Runs the robot's missions as a fixed set of periodic tasks on a single
//! cooperative scheduler. Every task gets exclusive access to the shared
//! [`Robot`](system::robot::Robot) context for the duration of its action.
//!
//! Hardware is reached only through the traits in [`system::devices`]; the
//! firmware package binds them to real motors and sensors.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

/// Mission selection and task assembly
pub mod mission;
/// Shared data, device interfaces and configuration
pub mod system;
/// Scheduler and periodic task implementations
pub mod task;

#[cfg(test)]
mod mock;

pub use mission::{Behavior, Mission};
pub use system::error::Error;
