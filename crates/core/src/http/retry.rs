//! Retry policy: a pure decision over error kind and attempt number.

use std::time::Duration;

use feedwire_common::BackoffStrategy;
use feedwire_domain::{ApiErrorKind, RetrySettings};

/// Outcome of consulting a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    #[must_use]
    pub const fn stop() -> Self {
        Self { should_retry: false, delay: Duration::ZERO }
    }

    #[must_use]
    pub const fn retry_after(delay: Duration) -> Self {
        Self { should_retry: true, delay }
    }
}

/// One initial attempt plus up to `max_retries` retries of transient
/// failures, spaced by exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Never retry.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_max_retries(0)
    }

    /// Default delays with `max_retries` retries.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::from_settings(&RetrySettings::with_max_retries(max_retries))
    }

    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff: BackoffStrategy::exponential(
                Duration::from_millis(settings.initial_delay_ms),
                settings.backoff_multiplier,
                Duration::from_millis(settings.max_delay_ms),
            ),
        }
    }

    #[must_use]
    pub const fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self { max_retries, backoff }
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decide whether to retry after attempt number `attempt` (0 for the
    /// initial attempt) failed with `kind`.
    ///
    /// Only transient kinds are retried; 4xx, auth and CSRF failures never
    /// are.
    #[must_use]
    pub fn decide(&self, kind: ApiErrorKind, attempt: u32) -> RetryDecision {
        if !kind.is_transient() || attempt >= self.max_retries {
            return RetryDecision::stop();
        }
        RetryDecision::retry_after(self.backoff.calculate_delay(attempt))
    }
}
