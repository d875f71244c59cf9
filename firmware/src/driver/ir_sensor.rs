//! EV3 infrared sensor handle
//!
//! The UART link task owns the serial port and publishes every data message
//! into [`READINGS`]. The handle given to the controller only posts mode
//! requests and reads the latest values, so none of its calls wait.
//!
//! A mode switch takes the sensor a moment. Until data of the requested mode
//! arrives the handle reports nothing detected: proximity 100, no beacon and
//! no remote button.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use gripper_rover::system::devices::{BeaconLocation, IrMode, IrSensor};
use gripper_rover::system::error::{DeviceKind, Error};

/// Latest values reported by the sensor, one per mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrReadings {
    /// Link is up and data arrives
    pub online: bool,
    /// Mode of the most recent data message
    pub mode: Option<IrMode>,
    pub proximity: i8,
    pub beacon: BeaconLocation,
    pub remote: u8,
}

impl IrReadings {
    pub const OFFLINE: Self = Self {
        online: false,
        mode: None,
        proximity: 100,
        beacon: BeaconLocation::NOT_DETECTED,
        remote: 0,
    };
}

pub static READINGS: Mutex<CriticalSectionRawMutex, Cell<IrReadings>> =
    Mutex::new(Cell::new(IrReadings::OFFLINE));

/// Mode the controller wants the sensor in
pub static MODE_REQUEST: Signal<CriticalSectionRawMutex, IrMode> = Signal::new();

/// Sensor mode number on the wire
pub fn mode_index(mode: IrMode) -> u8 {
    match mode {
        IrMode::Proximity => 0,
        IrMode::BeaconSeek => 1,
        IrMode::Remote => 2,
    }
}

pub fn mode_from_index(index: u8) -> Option<IrMode> {
    match index {
        0 => Some(IrMode::Proximity),
        1 => Some(IrMode::BeaconSeek),
        2 => Some(IrMode::Remote),
        _ => None,
    }
}

pub fn update(f: impl FnOnce(&mut IrReadings)) {
    READINGS.lock(|cell| {
        let mut readings = cell.get();
        f(&mut readings);
        cell.set(readings);
    });
}

/// Handle implementing [`IrSensor`] on top of the link task
#[derive(Default)]
pub struct Ev3IrSensor {
    mode: Option<IrMode>,
}

impl Ev3IrSensor {
    pub fn new() -> Self {
        Self { mode: None }
    }

    /// Latest readings, `None` while they belong to another mode
    fn latest(&self) -> Result<Option<IrReadings>, Error> {
        let readings = READINGS.lock(|cell| cell.get());
        if !readings.online {
            return Err(Error::Device(DeviceKind::IrSensor));
        }
        Ok(readings_for(readings, self.mode))
    }
}

fn readings_for(readings: IrReadings, mode: Option<IrMode>) -> Option<IrReadings> {
    (mode.is_some() && readings.mode == mode).then_some(readings)
}

impl IrSensor for Ev3IrSensor {
    fn set_mode(&mut self, mode: IrMode) -> Result<(), Error> {
        if self.mode != Some(mode) {
            // cached values are stale until the sensor reports the new mode
            update(|readings| readings.mode = None);
            MODE_REQUEST.signal(mode);
            self.mode = Some(mode);
        }
        Ok(())
    }

    fn read_distance(&mut self) -> Result<i8, Error> {
        Ok(self
            .latest()?
            .map_or(IrReadings::OFFLINE.proximity, |r| r.proximity))
    }

    fn read_beacon_location(&mut self) -> Result<BeaconLocation, Error> {
        Ok(self
            .latest()?
            .map_or(BeaconLocation::NOT_DETECTED, |r| r.beacon))
    }

    fn read_remote_command(&mut self) -> Result<u8, Error> {
        Ok(self.latest()?.map_or(IrReadings::OFFLINE.remote, |r| r.remote))
    }
}
