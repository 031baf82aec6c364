//! Reconnection supervisor state machine.
//!
//! Owns the connection lifecycle: it is the only component allowed to open
//! or close the transport. The machine is pure (no I/O, no timers); time is
//! passed as a parameter and the driver polls for due retries.
//!
//! # State machine
//!
//! ```text
//! ┌──────┐  start   ┌────────────┐  opened   ┌──────┐
//! │ Idle │─────────>│ Connecting │──────────>│ Open │
//! └──────┘          └────────────┘           └──────┘
//!    ^                │ failed / closed(≠1000)  │ closed(≠1000)
//!    │                ↓                         ↓
//!    │           ┌────────────────┐  retry due (fixed delay)
//!    │           │ WaitingToRetry │─────────> Connecting
//!    │           └────────────────┘
//!    │ closed(1000) from Open/Connecting, or shutdown from anywhere
//! ```
//!
//! At most one retry deadline exists; scheduling a new one supersedes the
//! old, so two concurrent connections can never be spawned.

use std::{ops::Sub, time::Duration};

/// Connection status exposed to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection, none pending. Terminal until the owner reconnects.
    Disconnected,
    /// An open attempt is in flight.
    Connecting,
    /// Connection established; actions and heartbeats flow.
    Open,
    /// An intentional close is in progress.
    Closing,
    /// Connection lost abnormally; a retry is scheduled.
    WaitingToRetry,
}

/// Internal supervisor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Idle,
    Connecting,
    Open,
    WaitingToRetry,
}

/// Outcome of feeding a close event to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Normal closure: terminal, no retry scheduled.
    Terminal,
    /// Abnormal closure: exactly one retry scheduled after the fixed delay.
    RetryScheduled,
    /// The supervisor was not responsible for a connection (already idle);
    /// the event is stale and ignored.
    Ignored,
}

/// Deterministic reconnection policy over an explicit state machine.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Supervisor<I = std::time::Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: LinkState,
    retry_delay: Duration,
    /// When the current wait began. `Some` only in `WaitingToRetry`.
    retry_since: Option<I>,
}

impl<I> Supervisor<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create an idle supervisor with the given fixed retry delay.
    pub fn new(retry_delay: Duration) -> Self {
        Self { state: LinkState::Idle, retry_delay, retry_since: None }
    }

    /// Current status as the owner sees it.
    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            LinkState::Idle => ConnectionStatus::Disconnected,
            LinkState::Connecting => ConnectionStatus::Connecting,
            LinkState::Open => ConnectionStatus::Open,
            LinkState::WaitingToRetry => ConnectionStatus::WaitingToRetry,
        }
    }

    /// True while a connection is established.
    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    /// Begin connecting. Returns true if a new open attempt should start.
    ///
    /// Idempotent: a no-op while already Connecting or Open. From
    /// `WaitingToRetry` the pending deadline is superseded and the attempt
    /// starts immediately.
    pub fn start(&mut self) -> bool {
        match self.state {
            LinkState::Idle | LinkState::WaitingToRetry => {
                self.retry_since = None;
                self.state = LinkState::Connecting;
                true
            },
            LinkState::Connecting | LinkState::Open => false,
        }
    }

    /// An open attempt succeeded.
    ///
    /// Returns false for a stale success (supervisor no longer connecting,
    /// e.g. the owner disconnected mid-dial); the caller must drop that
    /// connection to preserve the single-connection invariant.
    pub fn opened(&mut self) -> bool {
        if self.state == LinkState::Connecting {
            self.state = LinkState::Open;
            true
        } else {
            false
        }
    }

    /// An open attempt failed before a connection existed.
    pub fn open_failed(&mut self, now: I) -> CloseOutcome {
        match self.state {
            LinkState::Connecting => {
                self.schedule_retry(now);
                CloseOutcome::RetryScheduled
            },
            _ => CloseOutcome::Ignored,
        }
    }

    /// A connection closed with the given code.
    ///
    /// Code 1000 is intentional and terminal; any other code schedules
    /// exactly one retry after the fixed delay.
    pub fn closed(&mut self, code: u16, now: I) -> CloseOutcome {
        match self.state {
            LinkState::Open | LinkState::Connecting => {
                if talkwire_proto::should_retry(code) {
                    self.schedule_retry(now);
                    CloseOutcome::RetryScheduled
                } else {
                    self.state = LinkState::Idle;
                    self.retry_since = None;
                    CloseOutcome::Terminal
                }
            },
            LinkState::Idle | LinkState::WaitingToRetry => CloseOutcome::Ignored,
        }
    }

    /// Check whether the pending retry is due; if so, begin connecting.
    ///
    /// Returns true exactly once per scheduled retry.
    pub fn poll_retry(&mut self, now: I) -> bool {
        let Some(since) = self.retry_since else {
            return false;
        };

        if self.state == LinkState::WaitingToRetry && now - since >= self.retry_delay {
            self.retry_since = None;
            self.state = LinkState::Connecting;
            true
        } else {
            false
        }
    }

    /// Terminal teardown: cancel any pending retry and go idle.
    ///
    /// Returns true if a live connection should be closed by the caller.
    pub fn shutdown(&mut self) -> bool {
        let had_connection = self.state == LinkState::Open;
        self.state = LinkState::Idle;
        self.retry_since = None;
        had_connection
    }

    fn schedule_retry(&mut self, now: I) {
        // A single deadline slot: re-scheduling supersedes the old timer.
        self.retry_since = Some(now);
        self.state = LinkState::WaitingToRetry;
    }
}
