//! Client configuration structures
//!
//! Loaded by `feedwire_infra::config`; every field has a default so partial
//! files and environment overrides compose.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CSRF_COOKIE_MAX_AGE_SECS, CSRF_COOKIE_NAME, CSRF_HEADER, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_BASE_URL, DEFAULT_INITIAL_RETRY_DELAY_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_RETRY_DELAY_MS, DEFAULT_REFRESH_GRACE_SECS, DEFAULT_TIMEOUT_MS,
};
use crate::{FeedwireError, Result};

/// API client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Proactively refresh access tokens that are about to expire.
    pub token_refresh_enabled: bool,
    pub refresh_grace_seconds: i64,
    pub retry: RetrySettings,
    pub csrf: CsrfSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            token_refresh_enabled: false,
            refresh_grace_seconds: DEFAULT_REFRESH_GRACE_SECS,
            retry: RetrySettings::default(),
            csrf: CsrfSettings::default(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject configurations the client cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(FeedwireError::Config("base_url must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(FeedwireError::Config("timeout_ms must be greater than zero".into()));
        }
        if self.refresh_grace_seconds < 0 {
            return Err(FeedwireError::Config("refresh_grace_seconds must not be negative".into()));
        }
        self.retry.validate()
    }
}

/// Default retry settings for requests that do not carry their own policy.
///
/// `max_retries = 0` keeps retries disabled unless a caller opts in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetrySettings {
    /// Opt-in settings with `max_retries` retries and default delays.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] for a multiplier below 1 or a
    /// maximum delay shorter than the initial delay.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(FeedwireError::Config(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(FeedwireError::Config(
                "max_delay_ms must not be shorter than initial_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Server-side CSRF cookie settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfSettings {
    pub cookie_name: String,
    pub header_name: String,
    pub max_age_secs: u64,
    /// `Secure` cookie attribute; on in production.
    pub secure: bool,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            cookie_name: CSRF_COOKIE_NAME.to_string(),
            header_name: CSRF_HEADER.to_string(),
            max_age_secs: CSRF_COOKIE_MAX_AGE_SECS,
            secure: true,
        }
    }
}
