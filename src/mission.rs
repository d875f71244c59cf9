//! Mission selection and assembly
//!
//! A [`Mission`] runs one [`Behavior`] to completion: it builds the behavior's
//! task set, registers it with a fresh scheduler and runs until the keyboard
//! task requests a stop or a task fails. Either way the motors are powered
//! off and the LED turned dark before returning.

use crate::system::config::RobotConfig;
use crate::system::devices::{LedPattern, Platform, StatusIndicator};
use crate::system::error::Error;
use crate::system::robot::Robot;
use crate::task::garbage_collection::GarbageCollection;
use crate::task::keyboard::Keyboard;
use crate::task::line_following::LineFollowing;
use crate::task::remote_decode::RemoteDecode;
use crate::task::remote_drive::RemoteDrive;
use crate::task::scheduler::{PeriodicTask, Scheduler};
use crate::task::status::Status;

/// Largest task set of any behavior
pub const MAX_TASKS: usize = 4;

/// What the robot does during a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Behavior {
    /// Driven by the infrared remote
    RemoteControl,
    /// Collects objects and delivers them to the beacon
    GarbageCollection,
    /// Follows a line, clearing obstacles off it
    LineFollowing,
}

/// A configured mission, ready to run
pub struct Mission {
    behavior: Behavior,
    config: RobotConfig,
}

impl Mission {
    /// Validates the configuration up front
    pub fn new(behavior: Behavior, config: RobotConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { behavior, config })
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Run until stopped, then power everything off
    ///
    /// A task error ends the mission and is returned after the power-off.
    pub async fn run<P: Platform>(&self, robot: &mut Robot<P>) -> Result<(), Error> {
        info!("starting mission: {}", self.behavior);

        let config = &self.config;
        let mut keyboard = Keyboard::new(config.keyboard_period);
        let mut status = Status::new(self.behavior, config.status_period);

        let result = match self.behavior {
            Behavior::RemoteControl => {
                let mut decode = RemoteDecode::new(&config.remote);
                let mut drive = RemoteDrive::new(&config.remote);
                let mut tasks: [&mut dyn PeriodicTask<P>; 4] =
                    [&mut decode, &mut drive, &mut keyboard, &mut status];
                schedule(robot, &mut tasks).await
            }
            Behavior::GarbageCollection => {
                let mut collector = GarbageCollection::new(&config.garbage_collection);
                let mut tasks: [&mut dyn PeriodicTask<P>; 3] =
                    [&mut collector, &mut status, &mut keyboard];
                schedule(robot, &mut tasks).await
            }
            Behavior::LineFollowing => {
                let mut follower = LineFollowing::new(&config.line_following);
                let mut tasks: [&mut dyn PeriodicTask<P>; 3] =
                    [&mut follower, &mut status, &mut keyboard];
                schedule(robot, &mut tasks).await
            }
        };

        power_off(robot);

        match result {
            Ok(()) => info!("mission finished"),
            Err(e) => error!("mission aborted: {}", e),
        }
        result
    }
}

async fn schedule<P: Platform>(
    robot: &mut Robot<P>,
    tasks: &mut [&mut dyn PeriodicTask<P>],
) -> Result<(), Error> {
    let mut scheduler: Scheduler<'_, P, MAX_TASKS> = Scheduler::new();
    for task in tasks.iter_mut() {
        scheduler.register(&mut **task)?;
    }
    scheduler.start(robot).await
}

/// Best effort: failures are logged, not returned
fn power_off<P: Platform>(robot: &mut Robot<P>) {
    if let Err(e) = robot.devices.stop_motors() {
        warn!("failed to stop motors: {}", e);
    }
    if let Err(e) = robot.devices.status.set_pattern(LedPattern::Off) {
        warn!("failed to turn off status LED: {}", e);
    }
}
