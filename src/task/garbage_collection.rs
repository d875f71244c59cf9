//! Garbage Collection Task
//!
//! Autonomous mission: find an object with the proximity sensor, drive up to
//! it, grab it, find the infrared beacon, carry the object to the beacon and
//! drop it there. Repeats until the configured number of objects has been
//! delivered, then stays in [`GarbageCollectionState::Stop`] with every motor
//! at rest.
//!
//! # Motion
//! The motor setpoint is computed from scratch every period and applied at
//! the end of the period, so a state only has to state the powers it wants.
//! Pauses between phases are settle holds: the state stays current with all
//! motors at rest until the hold expires, while the scheduler keeps running.
//!
//! # Sweeps
//! Searches turn in place right until the left tachometer passes the sweep
//! extent, then left until it passes the negative extent, and start over if
//! nothing was found.

use embassy_time::{Duration, Instant};

use crate::system::config::GarbageCollectionConfig;
use crate::system::devices::{IrMode, IrSensor, Motor, Platform};
use crate::system::error::Error;
use crate::system::motor::MotorSetpoint;
use crate::system::robot::Robot;
use crate::system::state::{GarbageCollectionState, GarbageCollectionStatus};
use crate::task::scheduler::PeriodicTask;
use crate::task::state_machine::StateMachine;

/// Side a sweep is currently turning to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepSide {
    Right,
    Left,
}

/// Right-then-left in-place sweep driven by the left tachometer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sweep {
    extent: i32,
    side: SweepSide,
}

impl Sweep {
    fn new(extent: i32) -> Self {
        Self {
            extent,
            side: SweepSide::Right,
        }
    }

    /// Turn direction for this period: 1 is right, -1 is left
    fn update(&mut self, left_tachometer: i32) -> i8 {
        match self.side {
            SweepSide::Right if left_tachometer > self.extent => self.side = SweepSide::Left,
            SweepSide::Left if left_tachometer < -self.extent => self.side = SweepSide::Right,
            _ => {}
        }
        match self.side {
            SweepSide::Right => 1,
            SweepSide::Left => -1,
        }
    }
}

/// Steps of dropping an object at the beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryPhase {
    Opening,
    BackingOff,
    Turning,
}

pub struct GarbageCollection {
    config: GarbageCollectionConfig,
    fsm: StateMachine<GarbageCollectionState>,
    sweep: Sweep,
    delivery: DeliveryPhase,
    objects_collected: u8,
}

impl GarbageCollection {
    pub fn new(config: &GarbageCollectionConfig) -> Self {
        Self {
            config: config.clone(),
            fsm: StateMachine::new(GarbageCollectionState::Starting),
            sweep: Sweep::new(config.sweep_count),
            delivery: DeliveryPhase::Opening,
            objects_collected: 0,
        }
    }

    pub fn state(&self) -> GarbageCollectionState {
        self.fsm.current()
    }

    pub fn objects_collected(&self) -> u8 {
        self.objects_collected
    }

    pub fn status(&self) -> GarbageCollectionStatus {
        GarbageCollectionStatus {
            state: self.fsm.current(),
            objects_collected: self.objects_collected,
            objects_to_collect: self.config.objects_to_collect,
        }
    }

    fn go(&mut self, next: GarbageCollectionState) {
        info!("garbage collection: {} -> {}", self.fsm.current(), next);
        self.fsm.transition(next);
    }

    fn turn(&self, direction: i8) -> MotorSetpoint {
        MotorSetpoint::spin(direction * self.config.turn_power)
    }

    fn starting(&mut self, now: Instant) -> MotorSetpoint {
        if self.fsm.take_entry() {
            self.fsm.settle(now, self.config.settle_delay);
        }
        if !self.fsm.is_settling(now) {
            self.go(GarbageCollectionState::SearchingNextTarget);
        }
        MotorSetpoint::STOP
    }

    fn searching_next_target<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
    ) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.ir_sensor.set_mode(IrMode::Proximity)?;
            devices.left_motor.reset_tachometer()?;
            self.sweep = Sweep::new(self.config.sweep_count);
        }

        let distance = devices.ir_sensor.read_distance()?;
        robot.state.sensors.target_distance = Some(distance);

        let (min, max) = self.config.target_range;
        if distance > min && distance < max {
            debug!("target at {}", distance);
            self.go(GarbageCollectionState::DrivingTowardNextTarget);
            return Ok(MotorSetpoint::STOP);
        }

        let direction = self.sweep.update(devices.left_motor.tachometer()?);
        Ok(self.turn(direction))
    }

    fn driving_toward_next_target<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
    ) -> Result<MotorSetpoint, Error> {
        let _ = self.fsm.take_entry();

        let distance = robot.devices.ir_sensor.read_distance()?;
        robot.state.sensors.target_distance = Some(distance);

        if (0..self.config.collect_distance).contains(&distance) {
            self.go(GarbageCollectionState::CollectingTarget);
            return Ok(MotorSetpoint::STOP);
        }

        let power = self.config.approach_power_ratio * self.config.forward_power as f32;
        Ok(MotorSetpoint::tracks(power, power))
    }

    fn collecting_target<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        if self.fsm.take_entry() {
            robot.devices.gripper_motor.reset_tachometer()?;
            self.fsm.settle(now, self.config.grip_delay);
        }
        if self.fsm.is_settling(now) {
            return Ok(MotorSetpoint::STOP);
        }

        if robot.devices.gripper_motor.tachometer()? < self.config.gripper_closed_count {
            Ok(MotorSetpoint::grip(self.config.gripper_power))
        } else {
            self.go(GarbageCollectionState::SearchingBeacon);
            Ok(MotorSetpoint::STOP)
        }
    }

    fn searching_beacon<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.ir_sensor.set_mode(IrMode::BeaconSeek)?;
            devices.left_motor.reset_tachometer()?;
            self.sweep = Sweep::new(2 * self.config.sweep_count);
            self.fsm.settle(now, self.config.beacon_mode_delay);
        }
        if self.fsm.is_settling(now) {
            return Ok(MotorSetpoint::STOP);
        }

        let beacon = devices.ir_sensor.read_beacon_location()?;
        robot.state.sensors.beacon = Some(beacon);

        // heading 0 is how the sensor reports "no beacon"
        let deadband = self.config.beacon_deadband;
        if beacon.heading > -deadband && beacon.heading < deadband && beacon.heading != 0 {
            debug!("beacon ahead, heading {}", beacon.heading);
            self.go(GarbageCollectionState::DrivingTowardBeacon);
            return Ok(MotorSetpoint::STOP);
        }

        let direction = self.sweep.update(devices.left_motor.tachometer()?);
        Ok(self.turn(direction))
    }

    fn driving_toward_beacon<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
    ) -> Result<MotorSetpoint, Error> {
        let _ = self.fsm.take_entry();

        let beacon = robot.devices.ir_sensor.read_beacon_location()?;
        robot.state.sensors.beacon = Some(beacon);

        if !beacon.is_detected(self.config.beacon_lost_distance) {
            return Ok(MotorSetpoint::STOP);
        }

        if beacon.distance > self.config.delivery_distance {
            let base = self.config.beacon_power_ratio * self.config.forward_power as f32;
            let difference = -self.config.beacon_gain * beacon.heading as f32 * base;
            Ok(MotorSetpoint::tracks(
                (base - difference).max(0.0),
                (base + difference).max(0.0),
            ))
        } else {
            self.go(GarbageCollectionState::DeliveringTarget);
            Ok(MotorSetpoint::STOP)
        }
    }

    fn delivering_target<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
    ) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.left_motor.reset_tachometer()?;
            self.delivery = DeliveryPhase::Opening;
        }

        let mut setpoint = MotorSetpoint::STOP;

        if self.delivery == DeliveryPhase::Opening {
            if devices.gripper_motor.tachometer()? > 0 {
                setpoint = MotorSetpoint::grip(-self.config.gripper_power);
            } else {
                self.delivery = DeliveryPhase::BackingOff;
            }
        }

        if self.delivery == DeliveryPhase::BackingOff {
            setpoint = MotorSetpoint::straight(-self.config.backward_power);
            if devices.left_motor.tachometer()? < -self.config.back_off_count {
                devices.left_motor.reset_tachometer()?;
                self.delivery = DeliveryPhase::Turning;
                setpoint = MotorSetpoint::STOP;
            }
        }

        if self.delivery == DeliveryPhase::Turning {
            setpoint = self.turn(1);
            if devices.left_motor.tachometer()? > 2 * self.config.sweep_count {
                self.objects_collected = self.objects_collected.saturating_add(1);
                info!(
                    "delivered {} of {}",
                    self.objects_collected,
                    self.config.objects_to_collect
                );
                if self.objects_collected >= self.config.objects_to_collect {
                    self.go(GarbageCollectionState::Stop);
                } else {
                    self.go(GarbageCollectionState::Starting);
                }
                setpoint = MotorSetpoint::STOP;
            }
        }

        Ok(setpoint)
    }

    fn step<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        match self.fsm.current() {
            GarbageCollectionState::Starting => Ok(self.starting(now)),
            GarbageCollectionState::SearchingNextTarget => self.searching_next_target(robot),
            GarbageCollectionState::DrivingTowardNextTarget => {
                self.driving_toward_next_target(robot)
            }
            GarbageCollectionState::CollectingTarget => self.collecting_target(robot, now),
            GarbageCollectionState::SearchingBeacon => self.searching_beacon(robot, now),
            GarbageCollectionState::DrivingTowardBeacon => self.driving_toward_beacon(robot),
            GarbageCollectionState::DeliveringTarget => self.delivering_target(robot),
            GarbageCollectionState::Stop => {
                if self.fsm.take_entry() {
                    info!("garbage collection complete");
                }
                Ok(MotorSetpoint::STOP)
            }
        }
    }
}

impl<P: Platform> PeriodicTask<P> for GarbageCollection {
    fn name(&self) -> &'static str {
        "garbage collection"
    }

    fn period(&self) -> Duration {
        self.config.period
    }

    fn run(&mut self, robot: &mut Robot<P>, now: Instant) -> Result<(), Error> {
        let setpoint = self.step(robot, now)?;
        robot.devices.apply(setpoint)?;
        robot.state.setpoint = setpoint;
        robot.state.garbage_collection = self.status();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockPlatform};
    use crate::system::devices::BeaconLocation;
    use crate::system::error::DeviceKind;

    const PERIOD_MS: u64 = 100;

    struct Run {
        robot: Robot<MockPlatform>,
        task: GarbageCollection,
        t: u64,
    }

    impl Run {
        fn new() -> Self {
            Self {
                robot: mock::robot(),
                task: GarbageCollection::new(&GarbageCollectionConfig::default()),
                t: 0,
            }
        }

        fn step(&mut self) {
            self.task
                .run(&mut self.robot, Instant::from_millis(self.t))
                .unwrap();
            mock::advance_motors(&mut self.robot);
            self.t += PERIOD_MS;
        }

        /// Step until `state` is current, at most `limit` periods
        fn step_until(&mut self, state: GarbageCollectionState, limit: usize) {
            for _ in 0..limit {
                if self.task.state() == state {
                    return;
                }
                self.step();
            }
            assert_eq!(self.task.state(), state);
        }

        fn step_until_phase(&mut self, phase: DeliveryPhase, limit: usize) {
            for _ in 0..limit {
                self.step();
                if self.task.delivery == phase {
                    return;
                }
            }
            assert_eq!(self.task.delivery, phase);
        }
    }

    #[test]
    fn starting_settles_before_searching() {
        let mut run = Run::new();
        for _ in 0..10 {
            run.step();
            assert_eq!(run.task.state(), GarbageCollectionState::Starting);
            assert_eq!(run.robot.state.setpoint, MotorSetpoint::STOP);
        }
        run.step();
        assert_eq!(run.task.state(), GarbageCollectionState::SearchingNextTarget);
    }

    #[test]
    fn target_in_range_during_right_sweep_stops_immediately() {
        let mut run = Run::new();
        run.step_until(GarbageCollectionState::SearchingNextTarget, 20);

        for _ in 0..3 {
            run.step();
        }
        assert_eq!(run.robot.devices.left_motor.power, 25);
        assert_eq!(run.robot.devices.right_motor.power, -25);
        assert_eq!(run.robot.devices.ir_sensor.mode, IrMode::Proximity);

        run.robot.devices.ir_sensor.distance = 35;
        run.step();
        assert_eq!(
            run.task.state(),
            GarbageCollectionState::DrivingTowardNextTarget
        );
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::STOP);
        assert_eq!(run.robot.state.sensors.target_distance, Some(35));
    }

    #[test]
    fn target_window_bounds_are_exclusive() {
        for distance in [10, 60, 0, -5, 100] {
            let mut run = Run::new();
            run.step_until(GarbageCollectionState::SearchingNextTarget, 20);
            run.robot.devices.ir_sensor.distance = distance;
            run.step();
            assert_eq!(
                run.task.state(),
                GarbageCollectionState::SearchingNextTarget,
                "distance {}",
                distance
            );
        }
    }

    #[test]
    fn sweep_turns_back_and_restarts() {
        let mut run = Run::new();
        run.step_until(GarbageCollectionState::SearchingNextTarget, 20);

        let mut saw_left = false;
        let mut saw_right_again = false;
        for _ in 0..120 {
            run.step();
            let power = run.robot.devices.left_motor.power;
            if power < 0 {
                saw_left = true;
            } else if saw_left && power > 0 {
                saw_right_again = true;
            }
        }
        assert!(saw_left);
        assert!(saw_right_again);
        assert_eq!(run.task.state(), GarbageCollectionState::SearchingNextTarget);
    }

    #[test]
    fn zero_heading_never_counts_as_centered() {
        let mut run = Run::new();
        run.task.fsm.transition(GarbageCollectionState::SearchingBeacon);

        run.robot.devices.ir_sensor.beacon = BeaconLocation {
            heading: 0,
            distance: 50,
        };
        for _ in 0..40 {
            run.step();
        }
        assert_eq!(run.task.state(), GarbageCollectionState::SearchingBeacon);

        for heading in [5, -5] {
            run.robot.devices.ir_sensor.beacon.heading = heading;
            run.step();
            assert_eq!(run.task.state(), GarbageCollectionState::SearchingBeacon);
        }

        run.robot.devices.ir_sensor.beacon.heading = -4;
        run.step();
        assert_eq!(run.task.state(), GarbageCollectionState::DrivingTowardBeacon);
    }

    #[test]
    fn steers_toward_beacon_and_holds_when_lost() {
        let mut run = Run::new();
        run.robot.devices.ir_sensor.mode = IrMode::BeaconSeek;
        run.task
            .fsm
            .transition(GarbageCollectionState::DrivingTowardBeacon);

        // beacon to the right: left track faster
        run.robot.devices.ir_sensor.beacon = BeaconLocation {
            heading: 4,
            distance: 60,
        };
        run.step();
        let setpoint = run.robot.state.setpoint;
        assert!(setpoint.left > setpoint.right);
        assert!(setpoint.right >= 0);

        // far off to the left: left track drops to zero
        run.robot.devices.ir_sensor.beacon.heading = -20;
        run.step();
        assert_eq!(run.robot.state.setpoint.left, 0);
        assert!(run.robot.state.setpoint.right > 0);

        run.robot.devices.ir_sensor.beacon = BeaconLocation::NOT_DETECTED;
        run.step();
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::STOP);
        assert_eq!(run.task.state(), GarbageCollectionState::DrivingTowardBeacon);

        run.robot.devices.ir_sensor.beacon = BeaconLocation {
            heading: 1,
            distance: 30,
        };
        run.step();
        assert_eq!(run.task.state(), GarbageCollectionState::DeliveringTarget);
    }

    /// Plays the world around the robot: the object is found right away and
    /// the beacon is always straight ahead
    fn stage_world(run: &mut Run) {
        let ir = &mut run.robot.devices.ir_sensor;
        match run.task.state() {
            GarbageCollectionState::SearchingNextTarget => ir.distance = 35,
            GarbageCollectionState::DrivingTowardNextTarget => ir.distance = 12,
            GarbageCollectionState::SearchingBeacon => {
                ir.beacon = BeaconLocation {
                    heading: 2,
                    distance: 70,
                }
            }
            GarbageCollectionState::DrivingTowardBeacon => {
                ir.beacon = BeaconLocation {
                    heading: 2,
                    distance: 25,
                }
            }
            _ => ir.distance = 100,
        }
    }

    #[test]
    fn collects_quota_then_stops_for_good() {
        let mut run = Run::new();
        let mut counts = std::vec::Vec::new();

        for _ in 0..2000 {
            stage_world(&mut run);
            let before = run.task.objects_collected();
            run.step();
            let after = run.task.objects_collected();
            if after != before {
                assert_eq!(after, before + 1);
                counts.push((after, run.task.state()));
            }
            if run.task.state() == GarbageCollectionState::Stop {
                break;
            }
        }

        assert_eq!(
            counts,
            [
                (1, GarbageCollectionState::Starting),
                (2, GarbageCollectionState::Stop)
            ]
        );
        assert_eq!(run.robot.devices.ir_sensor.wrong_mode_reads, 0);

        for _ in 0..50 {
            stage_world(&mut run);
            run.step();
            assert_eq!(run.task.state(), GarbageCollectionState::Stop);
            assert_eq!(run.robot.state.setpoint, MotorSetpoint::STOP);
        }
        assert_eq!(
            run.robot.state.garbage_collection,
            GarbageCollectionStatus {
                state: GarbageCollectionState::Stop,
                objects_collected: 2,
                objects_to_collect: 2,
            }
        );
    }

    #[test]
    fn delivery_opens_backs_off_then_turns() {
        let mut run = Run::new();
        run.robot.devices.gripper_motor.tachometer = 300;
        run.task.fsm.transition(GarbageCollectionState::DeliveringTarget);

        run.step();
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::grip(-100));
        run.step_until_phase(DeliveryPhase::BackingOff, 10);
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::straight(-40));
        run.step_until_phase(DeliveryPhase::Turning, 20);
        // entry reset plus the reset after backing off
        assert_eq!(run.robot.devices.left_motor.resets, 2);
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::spin(25));
        assert_eq!(run.task.objects_collected(), 0);
    }

    #[test]
    fn motor_failure_names_the_failing_motor() {
        let mut run = Run::new();
        run.robot.devices.gripper_motor.fail = true;
        assert_eq!(
            run.task.run(&mut run.robot, Instant::from_millis(0)),
            Err(Error::Device(DeviceKind::GripperMotor))
        );

        let mut run = Run::new();
        run.robot.devices.right_motor.fail = true;
        assert_eq!(
            run.task.run(&mut run.robot, Instant::from_millis(0)),
            Err(Error::Device(DeviceKind::RightMotor))
        );
    }

    #[test]
    fn stale_proximity_after_mode_switch_is_not_a_target() {
        let mut run = Run::new();
        // left over from the previous approach, inside the target window
        run.robot.devices.ir_sensor.mode = IrMode::BeaconSeek;
        run.robot.devices.ir_sensor.distance = 14;
        run.robot.devices.ir_sensor.switch_latency = 1;
        run.task
            .fsm
            .transition(GarbageCollectionState::SearchingNextTarget);

        run.step();
        assert_eq!(run.robot.devices.ir_sensor.mode, IrMode::Proximity);
        assert_eq!(run.task.state(), GarbageCollectionState::SearchingNextTarget);
        assert_eq!(run.robot.state.sensors.target_distance, Some(100));
        assert_eq!(run.robot.state.setpoint, MotorSetpoint::spin(25));

        run.step();
        assert_eq!(
            run.task.state(),
            GarbageCollectionState::DrivingTowardNextTarget
        );
    }

    #[test]
    fn beacon_sweep_reaches_twice_the_target_sweep() {
        let mut run = Run::new();
        run.task.fsm.transition(GarbageCollectionState::SearchingBeacon);

        let mut turned_back_at = None;
        for _ in 0..100 {
            let tachometer = run.robot.devices.left_motor.tachometer;
            run.step();
            if run.robot.devices.left_motor.power < 0 {
                turned_back_at = Some(tachometer);
                break;
            }
        }

        let extent = 2 * GarbageCollectionConfig::default().sweep_count;
        let tachometer = turned_back_at.expect("beacon sweep never turned back");
        assert!(
            tachometer > extent && tachometer <= extent + 25,
            "turned back at {}",
            tachometer
        );
        assert_eq!(run.task.state(), GarbageCollectionState::SearchingBeacon);
    }
}
