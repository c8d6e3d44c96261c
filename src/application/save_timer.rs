//! One-shot debounce timer for deferred saves
//!
//! The timer is cooperative: it never fires on its own. The owner polls it
//! from its event loop when idle and runs the save once it reports due.
//! Arming an already armed timer keeps the original deadline, so a burst of
//! changes is saved one delay after the first change, not the last.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SaveTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SaveTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the countdown unless it is already running.
    ///
    /// Returns true if this call armed the timer.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarm and report true if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}
