//! Line Following Task
//!
//! Follows a dark line with the reflectance sensor, steering through the
//! lookup table. An obstacle in front of the robot is grabbed, carried off to
//! one side, dropped, and the robot returns to the line. The side alternates
//! from one obstacle to the next, starting with the right.

use embassy_time::{Duration, Instant};

use crate::system::config::LineFollowingConfig;
use crate::system::devices::{
    AudioCue, IrMode, IrSensor, LedPattern, Motor, Platform, ReflectanceSensor, Speaker,
    StatusIndicator,
};
use crate::system::error::Error;
use crate::system::motor::MotorSetpoint;
use crate::system::robot::Robot;
use crate::system::state::{LineFollowingState, LineFollowingStatus};
use crate::task::scheduler::PeriodicTask;
use crate::task::state_machine::StateMachine;

/// LED pattern shown in each line following state
pub fn led_pattern(state: LineFollowingState) -> LedPattern {
    match state {
        LineFollowingState::Starting | LineFollowingState::LineFollowing => LedPattern::Green,
        LineFollowingState::GrabbingObstacle
        | LineFollowingState::Rotating
        | LineFollowingState::Advancing
        | LineFollowingState::DeliveringObstacle => LedPattern::Red,
        LineFollowingState::Retracting | LineFollowingState::CounterRotating => LedPattern::Amber,
    }
}

pub struct LineFollowing {
    config: LineFollowingConfig,
    fsm: StateMachine<LineFollowingState>,
    /// Carry the next obstacle off to the left instead of the right
    left_first: bool,
    steering: f32,
    obstacles_cleared: u16,
}

impl LineFollowing {
    pub fn new(config: &LineFollowingConfig) -> Self {
        Self {
            config: config.clone(),
            fsm: StateMachine::new(LineFollowingState::Starting),
            left_first: false,
            steering: 0.0,
            obstacles_cleared: 0,
        }
    }

    pub fn state(&self) -> LineFollowingState {
        self.fsm.current()
    }

    pub fn status(&self) -> LineFollowingStatus {
        LineFollowingStatus {
            state: self.fsm.current(),
            steering: self.steering,
            obstacles_cleared: self.obstacles_cleared,
        }
    }

    fn go(&mut self, next: LineFollowingState) {
        info!("line following: {} -> {}", self.fsm.current(), next);
        self.fsm.transition(next);
    }

    /// Turn toward the side the obstacle is carried to, or back when `undo`
    fn side_turn(&self, undo: bool) -> MotorSetpoint {
        let right = self.left_first == undo;
        if right {
            MotorSetpoint::spin(self.config.turn_power)
        } else {
            MotorSetpoint::spin(-self.config.turn_power)
        }
    }

    fn starting(
        &mut self,
        robot: &mut Robot<impl Platform>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        if self.fsm.take_entry() {
            robot.devices.ir_sensor.set_mode(IrMode::Proximity)?;
            self.fsm.settle(now, self.config.settle_delay);
        }
        if !self.fsm.is_settling(now) {
            self.go(LineFollowingState::LineFollowing);
        }
        Ok(MotorSetpoint::STOP)
    }

    fn line_following(&mut self, robot: &mut Robot<impl Platform>) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.speaker.play(AudioCue::LineFollowingStarted);
        }

        let reflection = devices.reflectance.read()?;
        self.steering = self.config.steering.get_value(reflection as f32);
        let correction = self.config.steering_gain * self.steering;
        let base = self.config.forward_power as f32;

        let distance = devices.ir_sensor.read_distance()?;
        robot.state.sensors.reflection = Some(reflection);
        robot.state.sensors.target_distance = Some(distance);

        if distance > 0 && distance < self.config.min_obstacle_distance {
            debug!("obstacle at {}", distance);
            self.go(LineFollowingState::GrabbingObstacle);
            return Ok(MotorSetpoint::STOP);
        }

        Ok(MotorSetpoint::tracks(base + correction, base - correction))
    }

    fn grabbing_obstacle(
        &mut self,
        robot: &mut Robot<impl Platform>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.gripper_motor.reset_tachometer()?;
            devices.speaker.play(AudioCue::ObstacleFound);
            self.fsm.settle(now, self.config.grab_delay);
        }
        if self.fsm.is_settling(now) {
            return Ok(MotorSetpoint::STOP);
        }

        if devices.gripper_motor.tachometer()? < self.config.gripper_closed_count {
            Ok(MotorSetpoint::grip(self.config.gripper_power))
        } else {
            self.go(LineFollowingState::Rotating);
            Ok(MotorSetpoint::STOP)
        }
    }

    fn rotating(&mut self, robot: &mut Robot<impl Platform>) -> Result<MotorSetpoint, Error> {
        let left = &mut robot.devices.left_motor;
        if self.fsm.take_entry() {
            left.reset_tachometer()?;
        }

        let tachometer = left.tachometer()?;
        let half = self.config.half_sweep_count;
        let done = if self.left_first {
            tachometer < -half
        } else {
            tachometer > half
        };

        if done {
            self.go(LineFollowingState::Advancing);
            Ok(MotorSetpoint::STOP)
        } else {
            Ok(self.side_turn(false))
        }
    }

    fn advancing(&mut self, robot: &mut Robot<impl Platform>) -> Result<MotorSetpoint, Error> {
        let left = &mut robot.devices.left_motor;
        if self.fsm.take_entry() {
            left.reset_tachometer()?;
        }

        if left.tachometer()? > self.config.half_sweep_count {
            self.go(LineFollowingState::DeliveringObstacle);
            Ok(MotorSetpoint::STOP)
        } else {
            Ok(MotorSetpoint::straight(self.config.forward_power))
        }
    }

    fn delivering_obstacle(
        &mut self,
        robot: &mut Robot<impl Platform>,
    ) -> Result<MotorSetpoint, Error> {
        let devices = &mut robot.devices;
        if self.fsm.take_entry() {
            devices.left_motor.reset_tachometer()?;
        }

        if devices.gripper_motor.tachometer()? > 0 {
            Ok(MotorSetpoint::grip(-self.config.gripper_power))
        } else {
            self.go(LineFollowingState::Retracting);
            Ok(MotorSetpoint::STOP)
        }
    }

    fn retracting(&mut self, robot: &mut Robot<impl Platform>) -> Result<MotorSetpoint, Error> {
        let left = &mut robot.devices.left_motor;
        if self.fsm.take_entry() {
            left.reset_tachometer()?;
        }

        if left.tachometer()? < -self.config.half_sweep_count {
            self.go(LineFollowingState::CounterRotating);
            Ok(MotorSetpoint::STOP)
        } else {
            Ok(MotorSetpoint::straight(-self.config.backward_power))
        }
    }

    fn counter_rotating(
        &mut self,
        robot: &mut Robot<impl Platform>,
    ) -> Result<MotorSetpoint, Error> {
        let left = &mut robot.devices.left_motor;
        if self.fsm.take_entry() {
            left.reset_tachometer()?;
        }

        let tachometer = left.tachometer()? as f32;
        let limit = self.config.counter_rotation_ratio * self.config.half_sweep_count as f32;
        let done = if self.left_first {
            tachometer > limit
        } else {
            tachometer < -limit
        };

        if done {
            self.left_first = !self.left_first;
            self.obstacles_cleared = self.obstacles_cleared.saturating_add(1);
            self.go(LineFollowingState::LineFollowing);
            Ok(MotorSetpoint::STOP)
        } else {
            Ok(self.side_turn(true))
        }
    }

    fn step<P: Platform>(
        &mut self,
        robot: &mut Robot<P>,
        now: Instant,
    ) -> Result<MotorSetpoint, Error> {
        match self.fsm.current() {
            LineFollowingState::Starting => self.starting(robot, now),
            LineFollowingState::LineFollowing => self.line_following(robot),
            LineFollowingState::GrabbingObstacle => self.grabbing_obstacle(robot, now),
            LineFollowingState::Rotating => self.rotating(robot),
            LineFollowingState::Advancing => self.advancing(robot),
            LineFollowingState::DeliveringObstacle => self.delivering_obstacle(robot),
            LineFollowingState::Retracting => self.retracting(robot),
            LineFollowingState::CounterRotating => self.counter_rotating(robot),
        }
    }
}

impl<P: Platform> PeriodicTask<P> for LineFollowing {
    fn name(&self) -> &'static str {
        "line following"
    }

    fn period(&self) -> Duration {
        self.config.period
    }

    fn run(&mut self, robot: &mut Robot<P>, now: Instant) -> Result<(), Error> {
        robot
            .devices
            .status
            .set_pattern(led_pattern(self.fsm.current()))?;

        let setpoint = self.step(robot, now)?;
        robot.devices.apply(setpoint)?;
        robot.state.setpoint = setpoint;
        robot.state.line_following = self.status();
        Ok(())
    }
}
