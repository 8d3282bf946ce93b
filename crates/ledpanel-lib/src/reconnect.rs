//! Reconnection timing for the device WebSocket.
//!
//! Every close (clean, abnormal, or a failed connect) schedules exactly one
//! new attempt after a fixed delay. There is no backoff and no retry limit.
//! A close reported while an attempt is already scheduled is ignored, so two
//! reconnect timers can never be pending at once.

use std::time::{Duration, Instant};

/// Default delay between a close and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// What [`ReconnectState::on_close`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A new attempt is due at this instant.
    Scheduled(Instant),
    /// An attempt was already pending; nothing changed.
    AlreadyPending,
}

/// Fixed-delay reconnection state machine.
#[derive(Debug)]
pub struct ReconnectState {
    delay: Duration,
    pending: Option<Instant>,
    consecutive_failures: u32,
}

impl ReconnectState {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            consecutive_failures: 0,
        }
    }

    /// Create a new reconnection state with the default 2 s delay.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }

    /// Record a close and schedule the next attempt.
    pub fn on_close(&mut self, now: Instant) -> Schedule {
        if self.pending.is_some() {
            return Schedule::AlreadyPending;
        }
        let due = now + self.delay;
        self.pending = Some(due);
        Schedule::Scheduled(due)
    }

    /// Take the pending attempt if it is due.
    ///
    /// Returns `true` at most once per scheduled attempt.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(due) if now >= due => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Record a connect attempt that failed before the socket opened.
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    /// Record a successful open.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending attempt, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|due| due.saturating_duration_since(now))
    }

    /// Number of consecutive failed connect attempts.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
