//! Remote Decode Task
//!
//! Reads the infrared remote and publishes the decoded [`Direction`] into the
//! robot state for the drive task.
//!
//! Selecting beacon seek latches the sensor onto the beacon: while the latch
//! is set and the beacon stays in range the sensor is left in seek mode and
//! the remote is not read, so the last direction stays in force. Once the
//! beacon is lost the latch clears and remote decoding resumes. Right after
//! latching the sensor is given a short hold to switch modes; the beacon is
//! not judged lost before the hold expires.

use embassy_time::{Duration, Instant};

use crate::system::config::RemoteConfig;
use crate::system::devices::{IrMode, IrSensor, Platform};
use crate::system::error::Error;
use crate::system::robot::Robot;
use crate::system::state::Direction;
use crate::task::scheduler::PeriodicTask;

pub struct RemoteDecode {
    period: Duration,
    beacon_lost_distance: i8,
    beacon_mode_delay: Duration,
    beacon_latch: bool,
    seek_settle_until: Option<Instant>,
}

impl RemoteDecode {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            period: config.decode_period,
            beacon_lost_distance: config.beacon_lost_distance,
            beacon_mode_delay: config.beacon_mode_delay,
            beacon_latch: false,
            seek_settle_until: None,
        }
    }

    pub fn beacon_latched(&self) -> bool {
        self.beacon_latch
    }
}

impl<P: Platform> PeriodicTask<P> for RemoteDecode {
    fn name(&self) -> &'static str {
        "remote decode"
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn run(&mut self, robot: &mut Robot<P>, now: Instant) -> Result<(), Error> {
        let ir = &mut robot.devices.ir_sensor;

        if self.beacon_latch {
            ir.set_mode(IrMode::BeaconSeek)?;
            if self.seek_settle_until.is_some_and(|until| now < until) {
                return Ok(());
            }
            self.seek_settle_until = None;
            let beacon = ir.read_beacon_location()?;
            if beacon.is_detected(self.beacon_lost_distance) {
                return Ok(());
            }
            debug!("beacon lost, back to remote");
            self.beacon_latch = false;
        }

        ir.set_mode(IrMode::Remote)?;
        let code = ir.read_remote_command()?;
        let direction = Direction::from_remote_code(code);

        if direction != robot.state.direction {
            info!("remote direction: {}", direction);
            robot.state.direction = direction;
            self.beacon_latch = direction == Direction::BeaconSeek;
            if self.beacon_latch {
                ir.set_mode(IrMode::BeaconSeek)?;
                self.seek_settle_until = Some(now + self.beacon_mode_delay);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::system::devices::BeaconLocation;

    fn decoder() -> RemoteDecode {
        RemoteDecode::new(&RemoteConfig::default())
    }

    #[test]
    fn decodes_remote_into_direction() {
        let mut robot = mock::robot();
        let mut task = decoder();

        robot.devices.ir_sensor.remote = 5;
        task.run(&mut robot, Instant::from_millis(0)).unwrap();
        assert_eq!(robot.state.direction, Direction::Forward);
        assert_eq!(robot.devices.ir_sensor.mode, IrMode::Remote);

        robot.devices.ir_sensor.remote = 6;
        task.run(&mut robot, Instant::from_millis(100)).unwrap();
        assert_eq!(robot.state.direction, Direction::Stop);
        assert!(!task.beacon_latched());
    }

    #[test]
    fn beacon_in_range_suppresses_remote_decoding() {
        let mut robot = mock::robot();
        let mut task = decoder();

        robot.devices.ir_sensor.remote = 9;
        task.run(&mut robot, Instant::from_millis(0)).unwrap();
        assert_eq!(robot.state.direction, Direction::BeaconSeek);
        assert!(task.beacon_latched());

        // remote now says forward, but the beacon is in range
        robot.devices.ir_sensor.remote = 5;
        robot.devices.ir_sensor.beacon = BeaconLocation {
            heading: 3,
            distance: 40,
        };
        for t in [100, 200, 300] {
            task.run(&mut robot, Instant::from_millis(t)).unwrap();
            assert_eq!(robot.state.direction, Direction::BeaconSeek);
            assert_eq!(robot.devices.ir_sensor.mode, IrMode::BeaconSeek);
        }
        assert_eq!(robot.devices.ir_sensor.wrong_mode_reads, 0);

        // beacon gone: latch clears and the remote is read again
        robot.devices.ir_sensor.beacon = BeaconLocation::NOT_DETECTED;
        task.run(&mut robot, Instant::from_millis(400)).unwrap();
        assert!(!task.beacon_latched());
        assert_eq!(robot.state.direction, Direction::Forward);
        assert_eq!(robot.devices.ir_sensor.mode, IrMode::Remote);
    }

    #[test]
    fn holding_beacon_button_does_not_relatch() {
        let mut robot = mock::robot();
        let mut task = decoder();

        robot.devices.ir_sensor.remote = 9;
        task.run(&mut robot, Instant::from_millis(0)).unwrap();
        // still within the mode switch hold
        task.run(&mut robot, Instant::from_millis(100)).unwrap();
        assert!(task.beacon_latched());
        // beacon never seen, latch drops on the first read
        task.run(&mut robot, Instant::from_millis(200)).unwrap();
        assert!(!task.beacon_latched());
        assert_eq!(robot.state.direction, Direction::BeaconSeek);

        task.run(&mut robot, Instant::from_millis(300)).unwrap();
        assert!(!task.beacon_latched());
    }

    #[test]
    fn latch_survives_a_slow_mode_switch() {
        let mut robot = mock::robot();
        let mut task = decoder();
        robot.devices.ir_sensor.mode = IrMode::Remote;
        robot.devices.ir_sensor.switch_latency = 2;
        robot.devices.ir_sensor.beacon = BeaconLocation {
            heading: -2,
            distance: 50,
        };

        robot.devices.ir_sensor.remote = 9;
        task.run(&mut robot, Instant::from_millis(0)).unwrap();
        assert!(task.beacon_latched());
        assert_eq!(robot.devices.ir_sensor.mode, IrMode::BeaconSeek);

        robot.devices.ir_sensor.remote = 5;
        for t in [100, 200, 300, 400] {
            task.run(&mut robot, Instant::from_millis(t)).unwrap();
            assert!(task.beacon_latched(), "at {} ms", t);
            assert_eq!(robot.state.direction, Direction::BeaconSeek);
            assert_eq!(robot.devices.ir_sensor.mode, IrMode::BeaconSeek);
        }
        assert_eq!(robot.devices.ir_sensor.mode_switches, 1);
    }

    #[test]
    fn sensor_failure_propagates() {
        let mut robot = mock::robot();
        robot.devices.ir_sensor.fail = true;
        let mut task = decoder();
        assert_eq!(
            task.run(&mut robot, Instant::from_millis(0)),
            Err(Error::Device(crate::system::error::DeviceKind::IrSensor))
        );
    }
}
