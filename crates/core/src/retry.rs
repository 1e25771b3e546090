//! Bounded fixed-interval retry parameters for startup connections.
//!
//! Every service dials its broker and store with the same policy: a
//! fixed pause between attempts and a hard attempt cap. Exhausting the
//! cap at startup is fatal for the caller. The loop itself lives with
//! the connection it guards; this is only the shared tunable.

use std::time::Duration;

/// How often and how many times to re-attempt a startup connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempt cap. The first attempt counts.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// A near-instant policy for tests that exercise exhaustion.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_millis(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(3))
    }
}
