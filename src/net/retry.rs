//! Retry budget and backoff schedule

use std::time::Duration;

/// Configuration for retrying transient network failures
///
/// The delay before retry `n` (0-based) is `initial_backoff * backoff_factor^n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(250),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.saturating_pow(retry);
        self.initial_backoff.saturating_mul(factor)
    }
}
