//! Error types used throughout the application
//!
//! [`ApiError`] is the closed taxonomy every API call resolves to. It is
//! produced exactly once, by the request executor, and callers match on
//! [`ApiError::kind`] rather than re-classifying.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace error for wiring, configuration and storage concerns
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FeedwireError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Feedwire wiring operations
pub type Result<T> = std::result::Result<T, FeedwireError>;

/// Closed classification of [`ApiError`] variants.
///
/// Retry and propagation logic depends only on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// 401 - credentials missing, expired or revoked
    Auth,
    /// 403 whose body carries the CSRF failure signature
    Csrf,
    /// Any other 4xx
    Client,
    /// 5xx
    Server,
    /// No response received (connection refused, reset, DNS)
    Network,
    /// Client-side abort after the request timeout
    Timeout,
    /// Token persistence failed
    Storage,
    /// Response received but its shape was rejected
    InvalidResponse,
    /// Client misconfiguration (bad URL, unserializable body)
    Config,
    /// Abandoned by the caller before completion
    Cancelled,
}

impl ApiErrorKind {
    /// Transient kinds eligible for automatic retry.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Server | Self::Network | Self::Timeout)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Csrf => "csrf",
            Self::Client => "client",
            Self::Server => "server",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Storage => "storage",
            Self::InvalidResponse => "invalid_response",
            Self::Config => "config",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API operation errors
///
/// `Clone` so a single refresh failure can be handed to every caller that
/// awaited the shared refresh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Authentication required: {message}")]
    Auth { message: String },

    #[error("CSRF validation failed: {message}")]
    Csrf { message: String },

    #[error("{message}")]
    Http { status: u16, message: String, details: Option<serde_json::Value> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Structured HTTP error with the server-provided message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into(), details: None }
    }

    /// Generic message used when the error body is not parseable JSON.
    #[must_use]
    pub fn fallback_message(status: u16) -> String {
        format!("Request failed with status {status}")
    }

    /// Get the classification for this error
    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Auth { .. } => ApiErrorKind::Auth,
            Self::Csrf { .. } => ApiErrorKind::Csrf,
            Self::Http { status, .. } => {
                if *status >= 500 {
                    ApiErrorKind::Server
                } else {
                    ApiErrorKind::Client
                }
            }
            Self::Network(_) => ApiErrorKind::Network,
            Self::Timeout(_) => ApiErrorKind::Timeout,
            Self::Storage(_) => ApiErrorKind::Storage,
            Self::InvalidResponse { .. } => ApiErrorKind::InvalidResponse,
            Self::Config(_) => ApiErrorKind::Config,
            Self::Cancelled => ApiErrorKind::Cancelled,
        }
    }

    /// HTTP status associated with the error, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::Csrf { .. } => Some(403),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self.kind(), ApiErrorKind::Auth)
    }

    /// Check if this error should be retried
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_transient()
    }

    /// Server-supplied details, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Http { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<ApiError> for FeedwireError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(message) => Self::Network(message),
            ApiError::Storage(message) => Self::Storage(message),
            ApiError::Config(message) => Self::Config(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ApiError::Auth { message: "x".into() }.kind(), ApiErrorKind::Auth);
        assert_eq!(ApiError::Csrf { message: "x".into() }.kind(), ApiErrorKind::Csrf);
        assert_eq!(ApiError::http(404, "missing").kind(), ApiErrorKind::Client);
        assert_eq!(ApiError::http(503, "down").kind(), ApiErrorKind::Server);
        assert_eq!(ApiError::Network("reset".into()).kind(), ApiErrorKind::Network);
        assert_eq!(ApiError::Timeout(Duration::from_secs(1)).kind(), ApiErrorKind::Timeout);
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::http(500, "boom").is_retryable());
        assert!(ApiError::Network("refused".into()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_millis(10)).is_retryable());
        assert!(!ApiError::http(400, "bad").is_retryable());
        assert!(!ApiError::http(429, "slow down").is_retryable());
        assert!(!ApiError::Auth { message: "expired".into() }.is_retryable());
        assert!(!ApiError::Csrf { message: "mismatch".into() }.is_retryable());
        assert!(!ApiError::Storage("quota".into()).is_retryable());
        assert!(!ApiError::Cancelled.is_retryable());
    }

    #[test]
    fn test_status_predicates() {
        let not_found = ApiError::http(404, "missing");
        assert_eq!(not_found.status(), Some(404));
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());
        assert!(!not_found.is_auth_error());

        let auth = ApiError::Auth { message: "expired".into() };
        assert_eq!(auth.status(), Some(401));
        assert!(auth.is_client_error());
        assert!(auth.is_auth_error());

        let server = ApiError::http(502, "bad gateway");
        assert!(server.is_server_error());

        let network = ApiError::Network("reset".into());
        assert_eq!(network.status(), None);
        assert!(!network.is_client_error());
        assert!(!network.is_server_error());
    }

    #[test]
    fn test_http_display_uses_message() {
        let err = ApiError::http(418, ApiError::fallback_message(418));
        assert_eq!(err.to_string(), "Request failed with status 418");
    }

    #[test]
    fn test_details_accessor() {
        let err = ApiError::Http {
            status: 422,
            message: "Validation failed".into(),
            details: Some(serde_json::json!({"field": "url"})),
        };
        assert_eq!(err.details(), Some(&serde_json::json!({"field": "url"})));
        assert_eq!(ApiError::Network("x".into()).details(), None);
    }
}
