//! Calibration and timing configuration
//!
//! All thresholds, powers, gains and delays used by the behaviors live here
//! so the robot can be re-tuned without touching the state machines.
//! Tachometer thresholds are in raw tachometer counts, distances in sensor
//! percent units, powers in percent.

use embassy_time::Duration;

use crate::system::error::Error;
use crate::system::steering::SteeringLookupTable;

/// Remote control drive tasks
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub decode_period: Duration,
    pub drive_period: Duration,
    pub forward_power: i8,
    pub backward_power: i8,
    pub turn_power: i8,
    pub gripper_power: i8,
    /// Beacon distances at or below this mean the beacon is gone
    pub beacon_lost_distance: i8,
    /// Time the sensor gets to deliver seek data after latching the beacon
    pub beacon_mode_delay: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            decode_period: Duration::from_millis(100),
            drive_period: Duration::from_millis(100),
            forward_power: 80,
            backward_power: 50,
            turn_power: 25,
            gripper_power: 100,
            beacon_lost_distance: -100,
            beacon_mode_delay: Duration::from_millis(200),
        }
    }
}

/// Garbage collection mission
#[derive(Debug, Clone, PartialEq)]
pub struct GarbageCollectionConfig {
    pub period: Duration,
    pub objects_to_collect: u8,
    /// Pause before every search, lets previous motion die down
    pub settle_delay: Duration,
    /// Pause before closing the gripper
    pub grip_delay: Duration,
    /// Pause after switching the sensor to beacon seek mode
    pub beacon_mode_delay: Duration,
    pub forward_power: i8,
    pub backward_power: i8,
    pub turn_power: i8,
    pub gripper_power: i8,
    /// Left tachometer count of a half sweep (roughly a quarter turn)
    pub sweep_count: i32,
    /// Exclusive proximity window `(min, max)` in which a target counts
    pub target_range: (i8, i8),
    /// Proximity below which the target is within gripper reach
    pub collect_distance: i8,
    /// Gripper tachometer count of a fully closed gripper
    pub gripper_closed_count: i32,
    /// Exclusive heading deadband; a heading of exactly 0 never matches
    pub beacon_deadband: i8,
    pub beacon_lost_distance: i8,
    /// Beacon distance at which the target is dropped
    pub delivery_distance: i8,
    /// Proportional gain of the steering toward the beacon
    pub beacon_gain: f32,
    /// Fraction of forward power used while approaching the target
    pub approach_power_ratio: f32,
    /// Fraction of forward power used while approaching the beacon
    pub beacon_power_ratio: f32,
    /// Left tachometer count of the back-off after dropping the target
    pub back_off_count: i32,
}

impl Default for GarbageCollectionConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            objects_to_collect: 2,
            settle_delay: Duration::from_millis(1000),
            grip_delay: Duration::from_millis(100),
            beacon_mode_delay: Duration::from_millis(200),
            forward_power: 70,
            backward_power: 40,
            turn_power: 25,
            gripper_power: 100,
            sweep_count: 450,
            target_range: (10, 60),
            collect_distance: 15,
            gripper_closed_count: 3500,
            beacon_deadband: 5,
            beacon_lost_distance: -100,
            delivery_distance: 30,
            beacon_gain: 0.2,
            approach_power_ratio: 0.5,
            beacon_power_ratio: 0.3,
            back_off_count: 300,
        }
    }
}

/// Line following mission
#[derive(Debug, Clone, PartialEq)]
pub struct LineFollowingConfig {
    pub period: Duration,
    pub settle_delay: Duration,
    /// Pause after stopping in front of an obstacle
    pub grab_delay: Duration,
    pub forward_power: i8,
    pub backward_power: i8,
    pub turn_power: i8,
    pub gripper_power: i8,
    /// Left tachometer count of the rotate, advance and retract moves
    pub half_sweep_count: i32,
    /// Fraction of the rotation undone by the counter-rotation
    pub counter_rotation_ratio: f32,
    /// Proximity below which an obstacle is grabbed
    pub min_obstacle_distance: i8,
    pub gripper_closed_count: i32,
    /// Share of the steering correction applied to each track
    pub steering_gain: f32,
    pub steering: SteeringLookupTable,
}

impl Default for LineFollowingConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(50),
            settle_delay: Duration::from_millis(500),
            grab_delay: Duration::from_millis(500),
            forward_power: 25,
            backward_power: 20,
            turn_power: 20,
            gripper_power: 100,
            half_sweep_count: 400,
            counter_rotation_ratio: 0.8,
            min_obstacle_distance: 8,
            gripper_closed_count: 3500,
            steering_gain: 0.5,
            steering: SteeringLookupTable::default(),
        }
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfig {
    pub remote: RemoteConfig,
    pub garbage_collection: GarbageCollectionConfig,
    pub line_following: LineFollowingConfig,
    pub keyboard_period: Duration,
    pub status_period: Duration,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            garbage_collection: GarbageCollectionConfig::default(),
            line_following: LineFollowingConfig::default(),
            keyboard_period: Duration::from_millis(500),
            status_period: Duration::from_millis(500),
        }
    }
}

fn check(condition: bool, what: &'static str) -> Result<(), Error> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidConfig(what))
    }
}

impl RobotConfig {
    /// Reject values the behaviors cannot work with
    pub fn validate(&self) -> Result<(), Error> {
        check(self.keyboard_period.as_ticks() > 0, "keyboard period")?;
        check(self.status_period.as_ticks() > 0, "status period")?;

        let remote = &self.remote;
        check(remote.decode_period.as_ticks() > 0, "remote decode period")?;
        check(remote.drive_period.as_ticks() > 0, "remote drive period")?;
        check(
            remote.forward_power > 0
                && remote.backward_power > 0
                && remote.turn_power > 0
                && remote.gripper_power > 0,
            "remote powers",
        )?;

        let gc = &self.garbage_collection;
        check(gc.period.as_ticks() > 0, "garbage collection period")?;
        check(gc.objects_to_collect > 0, "objects to collect")?;
        check(gc.target_range.0 < gc.target_range.1, "target range")?;
        check(gc.sweep_count > 0, "sweep count")?;
        check(gc.back_off_count > 0, "back-off count")?;
        check(gc.gripper_closed_count > 0, "gripper closed count")?;
        check(gc.beacon_deadband > 1, "beacon deadband")?;
        check(
            gc.forward_power > 0
                && gc.backward_power > 0
                && gc.turn_power > 0
                && gc.gripper_power > 0,
            "garbage collection powers",
        )?;

        let lf = &self.line_following;
        check(lf.period.as_ticks() > 0, "line following period")?;
        check(lf.half_sweep_count > 0, "half sweep count")?;
        check(lf.gripper_closed_count > 0, "gripper closed count")?;
        check(lf.min_obstacle_distance > 0, "obstacle distance")?;
        check(
            lf.counter_rotation_ratio > 0.0 && lf.counter_rotation_ratio <= 1.0,
            "counter rotation ratio",
        )?;
        check(
            lf.forward_power > 0
                && lf.backward_power > 0
                && lf.turn_power > 0
                && lf.gripper_power > 0,
            "line following powers",
        )
    }
}
