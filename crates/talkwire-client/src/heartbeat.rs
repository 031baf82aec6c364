//! Heartbeat monitor.
//!
//! Emits a periodic liveness signal while the connection is open so
//! server-side presence does not expire. Armed on entering Open, disarmed on
//! any exit from Open; a beat can never fire on a non-open connection
//! because the monitor is inert while disarmed.

use std::{ops::Sub, time::Duration};

/// Fixed-interval heartbeat schedule. Pure; time is a parameter.
#[derive(Debug, Clone)]
pub struct Heartbeat<I = std::time::Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    interval: Duration,
    /// Last beat (or arming) time. `None` while disarmed.
    last_beat: Option<I>,
}

impl<I> Heartbeat<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a disarmed monitor with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_beat: None }
    }

    /// Arm the monitor. The first beat becomes due one interval from `now`.
    pub fn start(&mut self, now: I) {
        self.last_beat = Some(now);
    }

    /// Disarm the monitor. Call on any exit from the Open state.
    pub fn stop(&mut self) {
        self.last_beat = None;
    }

    /// True while armed.
    pub fn is_armed(&self) -> bool {
        self.last_beat.is_some()
    }

    /// Check whether a beat is due, consuming it if so.
    pub fn poll(&mut self, now: I) -> bool {
        match self.last_beat {
            Some(last) if now - last >= self.interval => {
                self.last_beat = Some(now);
                true
            },
            _ => false,
        }
    }
}
