//! Retry policy for downstream calls.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be repeated
//! - Compute the delay before the next attempt
//!
//! # Design Decisions
//! - Only connect-phase failures are retried, for every method
//! - Failures after a status line arrived are surfaced as-is

use std::time::Duration;

use crate::config::TransportConfig;
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Backoff factor in milliseconds.
    pub factor_ms: u64,
    /// Cap for a single delay in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_retries: config.connect_retries,
            factor_ms: config.backoff_factor_ms,
            max_delay_ms: config.max_backoff_ms,
        }
    }

    /// Delay before retry number `retry` if it is still allowed.
    pub fn next_delay(&self, retry: u32, connect_failure: bool) -> Option<Duration> {
        if !connect_failure || retry >= self.max_retries {
            return None;
        }
        Some(calculate_backoff(retry, self.factor_ms, self.max_delay_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.next_delay(0, true), Some(Duration::from_millis(500)));
        assert_eq!(policy.next_delay(2, true), Some(Duration::from_millis(2000)));
        assert_eq!(policy.next_delay(3, true), None);
    }

    #[test]
    fn test_non_connect_failures_not_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0, false), None);
    }
}
