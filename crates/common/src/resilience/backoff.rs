//! Backoff strategies for retry delays

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff strategy for calculating delays between retries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: `min(max_delay, initial_delay * base^attempt)`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    #[must_use]
    pub const fn exponential(initial_delay: Duration, base: f64, max_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base, max_delay }
    }

    /// Calculate the delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let cap = max_delay.as_millis() as f64;
                // NaN and infinity collapse onto the cap
                let delay_ms = if delay.is_finite() { delay.min(cap) } else { cap };
                Duration::from_millis(delay_ms.max(0.0) as u64)
            }
        }
    }
}
