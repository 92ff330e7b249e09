//! Exponential backoff.

use std::time::Duration;

/// Delay before retry number `retry` (0-based): `factor * 2^retry`, capped at `max_ms`.
pub fn calculate_backoff(retry: u32, factor_ms: u64, max_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(retry);
    let delay_ms = factor_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}
