//! Session-scoped CSRF state
//!
//! Three keys in session storage: the current token, the timestamp of the
//! last CSRF-triggered reload and a flag recording that a CSRF failure
//! happened in this session.

use std::sync::Arc;

use feedwire_common::{Clock, KeyValueStorage, StorageResult, SystemClock};
use feedwire_domain::constants::{
    CSRF_ERROR_FLAG_KEY, CSRF_RELOAD_STORAGE_KEY, CSRF_TOKEN_STORAGE_KEY,
};
use feedwire_domain::{CsrfToken, ReloadGuard};
use tracing::{debug, warn};

pub struct CsrfTokenStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
    clock: Arc<dyn Clock>,
}

impl CsrfTokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage: Some(storage), clock: Arc::new(SystemClock) }
    }

    pub fn unavailable() -> Self {
        Self { storage: None, clock: Arc::new(SystemClock) }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Most recently stored token.
    pub fn get(&self) -> Option<CsrfToken> {
        self.read(CSRF_TOKEN_STORAGE_KEY).filter(|value| !value.is_empty()).map(CsrfToken::new)
    }

    /// Store a rotated token.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the write is rejected.
    pub fn set(&self, token: &CsrfToken) -> StorageResult<()> {
        self.write(CSRF_TOKEN_STORAGE_KEY, token.as_str())?;
        debug!("csrf token rotated");
        Ok(())
    }

    /// Drop the cached token. Never fails.
    pub fn clear(&self) {
        self.remove(CSRF_TOKEN_STORAGE_KEY);
    }

    /// Record that a CSRF failure happened in this session.
    pub fn mark_error(&self) {
        if let Err(err) = self.write(CSRF_ERROR_FLAG_KEY, "true") {
            warn!(error = %err, "failed to set csrf error flag");
        }
    }

    pub fn has_error(&self) -> bool {
        self.read(CSRF_ERROR_FLAG_KEY).is_some_and(|flag| flag == "true")
    }

    pub fn clear_error(&self) {
        self.remove(CSRF_ERROR_FLAG_KEY);
    }

    pub fn reload_guard(&self) -> ReloadGuard {
        ReloadGuard {
            last_attempt_ms: self.read(CSRF_RELOAD_STORAGE_KEY).and_then(|raw| raw.parse().ok()),
        }
    }

    /// Claim the right to reload now.
    ///
    /// Returns `false` when a reload was recorded within the grace window.
    /// Otherwise records the current time and returns `true`; the timestamp
    /// is written before the caller reloads.
    pub fn try_begin_reload(&self) -> bool {
        let now_ms = self.clock.millis_since_epoch();
        if !self.reload_guard().allows_reload(now_ms) {
            return false;
        }
        if let Err(err) = self.write(CSRF_RELOAD_STORAGE_KEY, &now_ms.to_string()) {
            // Without a recorded timestamp the guard cannot stop a loop
            warn!(error = %err, "failed to record csrf reload, suppressing reload");
            return false;
        }
        true
    }

    fn read(&self, key: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        storage.get_item(key).unwrap_or_else(|err| {
            warn!(key, error = %err, "session storage read failed");
            None
        })
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        match self.storage.as_ref() {
            Some(storage) => storage.set_item(key, value),
            None => {
                warn!(key, "no session storage available, value not persisted");
                Ok(())
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.remove_item(key) {
                warn!(key, error = %err, "session storage remove failed");
            }
        }
    }
}

impl std::fmt::Debug for CsrfTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokenStore").field("available", &self.storage.is_some()).finish()
    }
}
