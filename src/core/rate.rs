use crate::core::traits::Pacer;
use std::time::{Duration, Instant};

/// Target spacing between events for an events/sec rate.
///
/// A zero rate floors to one second.
pub fn interval_for(events_per_second: u64) -> Duration {
    if events_per_second == 0 {
        Duration::from_secs(1)
    } else {
        Duration::from_secs_f64(1.0 / events_per_second as f64)
    }
}

/// Deadline-based pacer on the monotonic clock.
///
/// Each iteration may start no earlier than `interval` after the previous
/// one started. Iterations that overrun are not compensated for, so a slow
/// sink lowers the achieved rate instead of causing a burst.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    overruns: u64,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            overruns: 0,
        }
    }

    /// Iterations that took longer than the interval.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Time left before `deadline`, or `None` when it has already passed.
    fn remaining(deadline: Instant, now: Instant) -> Option<Duration> {
        deadline.checked_duration_since(now).filter(|left| !left.is_zero())
    }
}

impl Pacer for Ticker {
    fn wait(&mut self, iteration_start: Instant) {
        let deadline = iteration_start + self.interval;
        match Self::remaining(deadline, Instant::now()) {
            Some(left) => std::thread::sleep(left),
            None => self.overruns += 1,
        }
    }
}

/// Pacer that never waits; the sink's own latency sets the rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn wait(&mut self, _iteration_start: Instant) {}
}
