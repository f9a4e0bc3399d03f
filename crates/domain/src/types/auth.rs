//! Bearer token types

use serde::{Deserialize, Serialize};

/// Access/refresh token pair as persisted by the token store.
///
/// Created on login, replaced on refresh, removed on logout or an
/// unrecoverable 401.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenPair {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self { access_token: Some(access_token.into()), refresh_token }
    }

    /// True when neither token is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

// Token values must never reach logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Claims decoded from the payload segment of a JWT.
///
/// Derived on demand from the raw token and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Expiry, unix seconds.
    pub exp: i64,
    pub sub: Option<String>,
}

impl TokenClaims {
    #[must_use]
    pub const fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.exp
    }

    #[must_use]
    pub const fn expires_within(&self, now_secs: i64, grace_secs: i64) -> bool {
        self.exp.saturating_sub(now_secs) <= grace_secs
    }
}
