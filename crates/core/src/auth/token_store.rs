//! Token persistence and local expiry checks
//!
//! The access and refresh tokens are stored together as one JSON-encoded
//! [`TokenPair`] under a single persistent key. Reads never fail: an absent
//! backend or a corrupted value reads as "no token".

use std::sync::Arc;

use feedwire_common::auth::jwt;
use feedwire_common::{Clock, KeyValueStorage, StorageResult, SystemClock};
use feedwire_domain::constants::TOKEN_STORAGE_KEY;
use feedwire_domain::TokenPair;
use tracing::{debug, warn};

/// Owner of the persisted token pair.
pub struct TokenStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage: Some(storage), clock: Arc::new(SystemClock) }
    }

    /// Store with no backend, e.g. outside a browser context. Reads return
    /// `None` and writes are skipped with a warning.
    pub fn unavailable() -> Self {
        Self { storage: None, clock: Arc::new(SystemClock) }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current access token.
    pub fn get(&self) -> Option<String> {
        self.load().and_then(|pair| pair.access_token)
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.load().and_then(|pair| pair.refresh_token)
    }

    /// Persist a new access token, keeping the stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StorageError`](feedwire_common::StorageError)
    /// when the write is rejected.
    pub fn set(&self, token: &str) -> StorageResult<()> {
        let mut pair = self.load().unwrap_or_default();
        pair.access_token = Some(token.to_string());
        self.save(&pair)
    }

    /// Persist a new refresh token, keeping the stored access token.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the write is rejected.
    pub fn set_refresh_token(&self, token: &str) -> StorageResult<()> {
        let mut pair = self.load().unwrap_or_default();
        pair.refresh_token = Some(token.to_string());
        self.save(&pair)
    }

    /// Replace both tokens.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the write is rejected.
    pub fn store_pair(&self, pair: &TokenPair) -> StorageResult<()> {
        self.save(pair)
    }

    /// Remove the access token. Never fails.
    pub fn clear(&self) {
        let Some(mut pair) = self.load() else {
            self.remove_key();
            return;
        };
        pair.access_token = None;
        if pair.is_empty() {
            self.remove_key();
        } else if let Err(err) = self.save(&pair) {
            warn!(error = %err, "failed to clear access token");
        }
    }

    /// Remove both tokens. Never fails.
    pub fn clear_all(&self) {
        self.remove_key();
    }

    /// Fail-closed: malformed tokens count as expired.
    pub fn is_expired(&self, token: &str) -> bool {
        jwt::is_expired(token, self.clock.unix_secs())
    }

    /// Fail-closed: malformed tokens count as expiring.
    pub fn is_expiring_soon(&self, token: &str, grace_seconds: i64) -> bool {
        jwt::is_expiring_soon(token, self.clock.unix_secs(), grace_seconds)
    }

    fn load(&self) -> Option<TokenPair> {
        let storage = self.storage.as_ref()?;
        let raw = match storage.get_item(TOKEN_STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "token storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!(error = %err, "discarding corrupted token entry");
                None
            }
        }
    }

    fn save(&self, pair: &TokenPair) -> StorageResult<()> {
        let Some(storage) = self.storage.as_ref() else {
            warn!("no client storage available, token not persisted");
            return Ok(());
        };
        let encoded = serde_json::to_string(pair)?;
        storage.set_item(TOKEN_STORAGE_KEY, &encoded)?;
        debug!(has_refresh = pair.refresh_token.is_some(), "token pair persisted");
        Ok(())
    }

    fn remove_key(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.remove_item(TOKEN_STORAGE_KEY) {
                warn!(error = %err, "failed to clear token storage");
            }
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("available", &self.storage.is_some()).finish()
    }
}
