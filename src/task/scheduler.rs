//! Cooperative Scheduler
//!
//! Runs a fixed, ordered set of periodic tasks over the shared [`Robot`]
//! context. All actions run on the one async task that drives the scheduler,
//! one after the other, so no two actions ever overlap and the robot state
//! needs no locking.
//!
//! # Timing
//! - A task fires on the first pass and then whenever at least its period has
//!   elapsed since it last fired
//! - Due tasks fire in registration order within a pass
//! - Between passes the scheduler sleeps until the earliest next deadline
//!
//! # Stopping
//! A stop request on the robot state is checked before and after every pass,
//! so the pass that raised it always completes and the scheduler returns
//! without sleeping to the next deadline. An error returned
//! by a task ends the loop immediately and is handed to the caller.

use embassy_time::{Duration, Instant, Timer};
use heapless::Vec;

use crate::system::devices::Platform;
use crate::system::error::Error;
use crate::system::robot::Robot;

/// A unit of periodic work
pub trait PeriodicTask<P: Platform> {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Minimum time between two firings
    fn period(&self) -> Duration;

    /// One firing; `now` is the time of the current scheduler pass
    fn run(&mut self, robot: &mut Robot<P>, now: Instant) -> Result<(), Error>;
}

/// Registered task and the time it last fired
struct Slot<'t, P: Platform> {
    task: &'t mut dyn PeriodicTask<P>,
    last_fired: Option<Instant>,
}

impl<P: Platform> Slot<'_, P> {
    fn is_due(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.task.period()),
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.last_fired.map(|last| last + self.task.period())
    }
}

/// Fixed set of up to `N` periodic tasks
pub struct Scheduler<'t, P: Platform, const N: usize> {
    slots: Vec<Slot<'t, P>, N>,
}

impl<'t, P: Platform, const N: usize> Default for Scheduler<'t, P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t, P: Platform, const N: usize> Scheduler<'t, P, N> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Add a task; tasks fire in the order they were registered
    pub fn register(&mut self, task: &'t mut dyn PeriodicTask<P>) -> Result<(), Error> {
        debug!("registering task {}", task.name());
        self.slots
            .push(Slot {
                task,
                last_fired: None,
            })
            .map_err(|_| Error::SchedulerFull)
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fire every task that is due at `now`, in registration order
    ///
    /// Returns how many tasks fired.
    pub fn run_pass(&mut self, robot: &mut Robot<P>, now: Instant) -> Result<usize, Error> {
        let mut fired = 0;
        for slot in self.slots.iter_mut() {
            if !slot.is_due(now) {
                continue;
            }
            slot.last_fired = Some(now);
            if let Err(e) = slot.task.run(robot, now) {
                error!("task {} failed: {}", slot.task.name(), e);
                return Err(e);
            }
            fired += 1;
        }
        Ok(fired)
    }

    /// Earliest time at which some task becomes due again
    ///
    /// `None` until every task has fired once.
    pub fn next_deadline(&self) -> Option<Instant> {
        let mut earliest: Option<Instant> = None;
        for slot in self.slots.iter() {
            let deadline = slot.next_deadline()?;
            earliest = Some(match earliest {
                Some(current) if current <= deadline => current,
                _ => deadline,
            });
        }
        earliest
    }

    /// Run passes until a stop is requested
    pub async fn start(&mut self, robot: &mut Robot<P>) -> Result<(), Error> {
        if self.slots.is_empty() {
            return Err(Error::NoTasks);
        }

        info!("scheduler started with {} tasks", self.slots.len());
        while !robot.state.stop_requested() {
            self.run_pass(robot, Instant::now())?;
            if robot.state.stop_requested() {
                break;
            }

            if let Some(deadline) = self.next_deadline() {
                Timer::at(deadline).await;
            }
        }
        info!("scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockPlatform};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec as StdVec;

    /// Records (name, time) of every firing into a shared log
    struct Recorder {
        name: &'static str,
        period: Duration,
        log: Rc<RefCell<StdVec<(&'static str, u64)>>>,
        stop_after: Option<usize>,
        fail_on: Option<usize>,
        runs: usize,
    }

    impl Recorder {
        fn new(
            name: &'static str,
            period_ms: u64,
            log: &Rc<RefCell<StdVec<(&'static str, u64)>>>,
        ) -> Self {
            Self {
                name,
                period: Duration::from_millis(period_ms),
                log: log.clone(),
                stop_after: None,
                fail_on: None,
                runs: 0,
            }
        }
    }

    impl PeriodicTask<MockPlatform> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn period(&self) -> Duration {
            self.period
        }

        fn run(&mut self, robot: &mut Robot<MockPlatform>, now: Instant) -> Result<(), Error> {
            self.runs += 1;
            self.log.borrow_mut().push((self.name, now.as_millis()));
            if self.fail_on == Some(self.runs) {
                return Err(Error::Device(crate::system::error::DeviceKind::IrSensor));
            }
            if self.stop_after == Some(self.runs) {
                robot.state.request_stop();
            }
            Ok(())
        }
    }

    #[test]
    fn fires_on_period_in_registration_order() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut fast = Recorder::new("fast", 50, &log);
        let mut slow = Recorder::new("slow", 100, &log);
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 4> = Scheduler::new();
        scheduler.register(&mut slow).unwrap();
        scheduler.register(&mut fast).unwrap();

        for t in [0, 25, 50, 99, 100, 149, 150] {
            scheduler
                .run_pass(&mut robot, Instant::from_millis(t))
                .unwrap();
        }

        assert_eq!(
            *log.borrow(),
            [
                ("slow", 0),
                ("fast", 0),
                ("fast", 50),
                ("slow", 100),
                ("fast", 100),
                ("fast", 150),
            ]
        );
    }

    #[test]
    fn next_deadline_is_the_earliest_due_time() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut a = Recorder::new("a", 500, &log);
        let mut b = Recorder::new("b", 100, &log);
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 2> = Scheduler::new();
        scheduler.register(&mut a).unwrap();
        scheduler.register(&mut b).unwrap();

        assert_eq!(scheduler.next_deadline(), None);
        scheduler
            .run_pass(&mut robot, Instant::from_millis(10))
            .unwrap();
        assert_eq!(scheduler.next_deadline(), Some(Instant::from_millis(110)));
    }

    #[test]
    fn rejects_tasks_beyond_capacity() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut a = Recorder::new("a", 10, &log);
        let mut b = Recorder::new("b", 10, &log);
        let mut scheduler: Scheduler<'_, MockPlatform, 1> = Scheduler::new();
        assert_eq!(scheduler.register(&mut a), Ok(()));
        assert_eq!(scheduler.register(&mut b), Err(Error::SchedulerFull));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn failing_task_aborts_the_pass() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut first = Recorder::new("first", 10, &log);
        first.fail_on = Some(1);
        let mut second = Recorder::new("second", 10, &log);
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 2> = Scheduler::new();
        scheduler.register(&mut first).unwrap();
        scheduler.register(&mut second).unwrap();

        let result = scheduler.run_pass(&mut robot, Instant::from_millis(0));
        assert_eq!(
            result,
            Err(Error::Device(crate::system::error::DeviceKind::IrSensor))
        );
        assert_eq!(*log.borrow(), [("first", 0)]);
    }

    #[test]
    fn stop_request_lets_the_current_pass_finish() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut stopper = Recorder::new("stopper", 1, &log);
        stopper.stop_after = Some(2);
        let mut other = Recorder::new("other", 1, &log);
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 2> = Scheduler::new();
        scheduler.register(&mut stopper).unwrap();
        scheduler.register(&mut other).unwrap();

        embassy_futures::block_on(scheduler.start(&mut robot)).unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].0, "stopper");
        assert_eq!(log[3].0, "other");
        assert!(robot.state.stop_requested());
    }

    #[test]
    fn stop_returns_without_waiting_for_the_next_deadline() {
        let log = Rc::new(RefCell::new(StdVec::new()));
        let mut stopper = Recorder::new("stopper", 10_000, &log);
        stopper.stop_after = Some(1);
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 1> = Scheduler::new();
        scheduler.register(&mut stopper).unwrap();

        let started = Instant::now();
        embassy_futures::block_on(scheduler.start(&mut robot)).unwrap();

        assert!(started.elapsed() < Duration::from_millis(1000));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn start_without_tasks_is_an_error() {
        let mut robot = mock::robot();
        let mut scheduler: Scheduler<'_, MockPlatform, 2> = Scheduler::new();
        assert_eq!(
            embassy_futures::block_on(scheduler.start(&mut robot)),
            Err(Error::NoTasks)
        );
    }
}
