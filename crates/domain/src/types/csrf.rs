//! CSRF value types

use serde::{Deserialize, Serialize};

use crate::constants::{CSRF_RELOAD_GRACE_MS, CSRF_TOKEN_LENGTH};
use crate::impl_wire_enum_conversions;

/// A CSRF token: 256 random bits, base64url without padding.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// 43 characters drawn from `[A-Za-z0-9_-]`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == CSRF_TOKEN_LENGTH
            && self.0.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CsrfToken(<{} chars>)", self.0.len())
    }
}

impl AsRef<str> for CsrfToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Timestamp of the last CSRF-triggered reload, kept in session storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReloadGuard {
    pub last_attempt_ms: Option<u64>,
}

impl ReloadGuard {
    #[must_use]
    pub const fn at(last_attempt_ms: u64) -> Self {
        Self { last_attempt_ms: Some(last_attempt_ms) }
    }

    /// Whether a reload may happen at `now_ms`.
    ///
    /// A timestamp in the future (clock skew) counts as a recent reload.
    #[must_use]
    pub const fn allows_reload(&self, now_ms: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= CSRF_RELOAD_GRACE_MS,
        }
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl_wire_enum_conversions!(SameSite {
    Strict => "Strict",
    Lax => "Lax",
    None => "None",
});
