//! State machine bookkeeping shared by the mission behaviors
//!
//! Tracks the current and previous state, whether the entry action of the
//! current state still has to run, and an optional settle hold. A settle hold
//! keeps the behavior idle until a deadline without blocking the scheduler.

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMachine<S: Copy + PartialEq> {
    current: S,
    previous: Option<S>,
    entry_pending: bool,
    settle_until: Option<Instant>,
}

impl<S: Copy + PartialEq> StateMachine<S> {
    /// Start in `initial` with its entry action pending
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            entry_pending: true,
            settle_until: None,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    /// Returns true exactly once after entering a state
    pub fn take_entry(&mut self) -> bool {
        core::mem::take(&mut self.entry_pending)
    }

    /// Move to `next`; its entry action becomes pending and any hold is dropped
    ///
    /// A transition to the current state is ignored.
    pub fn transition(&mut self, next: S) {
        if next == self.current {
            return;
        }
        self.previous = Some(self.current);
        self.current = next;
        self.entry_pending = true;
        self.settle_until = None;
    }

    /// Hold the current state idle for `delay` starting at `now`
    pub fn settle(&mut self, now: Instant, delay: Duration) {
        self.settle_until = Some(now + delay);
    }

    /// Whether a settle hold is still running at `now`
    ///
    /// An expired hold is cleared.
    pub fn is_settling(&mut self, now: Instant) -> bool {
        match self.settle_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.settle_until = None;
                false
            }
            None => false,
        }
    }
}
