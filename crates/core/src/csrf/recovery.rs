//! Recovery from a rejected CSRF token
//!
//! A 403 whose message carries the CSRF failure signature means the cached
//! token is stale. The token is dropped, the session is flagged and the page
//! reloads to obtain a fresh cookie/header pair, at most once per grace
//! window.

use std::sync::Arc;

use tracing::{info, warn};

use super::token_store::CsrfTokenStore;
use crate::navigation_ports::Navigator;

const FAILURE_TERMS: [&str; 5] = ["invalid", "missing", "mismatch", "failed", "token"];

/// Case-insensitive: mentions "csrf" together with one of the failure terms.
#[must_use]
pub fn matches_csrf_signature(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("csrf") && FAILURE_TERMS.iter().any(|term| lowered.contains(term))
}

/// A 403 response whose body matches the CSRF failure signature.
#[must_use]
pub fn is_csrf_failure(status: u16, body: &str) -> bool {
    status == 403 && matches_csrf_signature(body)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Token cleared and a reload was requested.
    Reloaded,
    /// Token cleared; a recent reload suppressed another one.
    ReloadSuppressed,
}

pub struct CsrfRecovery {
    store: Arc<CsrfTokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl CsrfRecovery {
    pub fn new(store: Arc<CsrfTokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn recover(&self) -> RecoveryOutcome {
        self.store.clear();
        self.store.mark_error();

        if self.store.try_begin_reload() {
            info!("csrf token rejected, reloading page");
            self.navigator.reload();
            RecoveryOutcome::Reloaded
        } else {
            warn!("csrf token rejected again within reload grace window, not reloading");
            RecoveryOutcome::ReloadSuppressed
        }
    }
}
