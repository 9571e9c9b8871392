//! # Reconnect Backoff
//!
//! Fibonacci-paced delay between failed list/watch attempts, so a degraded
//! API server is not hammered in a tight loop. The sequence grows more slowly
//! than exponential backoff: min, min, 2*min, 3*min, 5*min, ... capped at max.
//! It is reset once a watch session has delivered a notification or closed
//! cleanly.

use std::time::Duration;

/// Fibonacci backoff calculator, in milliseconds
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    /// Minimum delay in milliseconds (for reset)
    min_millis: u64,
    /// Previous delay in milliseconds
    prev_millis: u64,
    /// Current delay in milliseconds
    current_millis: u64,
    /// Maximum delay in milliseconds
    max_millis: u64,
}

impl ReconnectBackoff {
    /// Create a new backoff with the given minimum and maximum delays in milliseconds.
    ///
    /// A minimum of zero disables the delay entirely.
    #[must_use]
    pub fn new(min_millis: u64, max_millis: u64) -> Self {
        Self {
            min_millis,
            prev_millis: 0,
            current_millis: min_millis.min(max_millis),
            max_millis,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_delay(&mut self) -> Duration {
        let result = self.current_millis;

        let next_millis = self.prev_millis.saturating_add(self.current_millis);
        self.prev_millis = self.current_millis;
        self.current_millis = std::cmp::min(next_millis.max(self.min_millis), self.max_millis);

        Duration::from_millis(result)
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_millis = 0;
        self.current_millis = self.min_millis.min(self.max_millis);
    }
}
