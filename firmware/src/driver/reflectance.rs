//! Reflected light sensor handle
//!
//! The sampling task publishes the filtered intensity into [`LATEST`]; the
//! handle only reads it.

use core::sync::atomic::{AtomicU8, Ordering};

use gripper_rover::system::devices::ReflectanceSensor;
use gripper_rover::system::error::{DeviceKind, Error};

/// Marks that no sample was taken yet
const NO_SAMPLE: u8 = u8::MAX;

static LATEST: AtomicU8 = AtomicU8::new(NO_SAMPLE);

/// Publish a new intensity, 0 (black) to 100 (white)
pub fn publish(intensity: u8) {
    LATEST.store(intensity.min(100), Ordering::Relaxed);
}

#[derive(Debug, Default)]
pub struct Reflectance;

impl ReflectanceSensor for Reflectance {
    fn read(&mut self) -> Result<u8, Error> {
        match LATEST.load(Ordering::Relaxed) {
            NO_SAMPLE => Err(Error::Device(DeviceKind::ReflectanceSensor)),
            intensity => Ok(intensity),
        }
    }
}
