//! Single-flight token refresh
//!
//! The first caller that needs a refresh creates the refresh future and
//! memoizes it as a [`Shared`] future. Callers arriving while it is pending
//! clone and await the same future, so the gateway sees exactly one call.
//! The mutex guards only the memo slot and is never held across an await.

use std::sync::Arc;

use feedwire_domain::{ApiError, TokenPair};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::ports::AuthGateway;
use super::token_store::TokenStore;

type SharedRefresh = Shared<BoxFuture<'static, Result<TokenPair, ApiError>>>;

/// Coordinates refreshes against one [`AuthGateway`] and [`TokenStore`].
pub struct RefreshCoordinator {
    gateway: Arc<dyn AuthGateway>,
    tokens: Arc<TokenStore>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl RefreshCoordinator {
    pub fn new(gateway: Arc<dyn AuthGateway>, tokens: Arc<TokenStore>) -> Self {
        Self { gateway, tokens, in_flight: Mutex::new(None) }
    }

    /// Refresh the token pair, joining a refresh already in flight.
    ///
    /// On success the new pair is persisted before any waiter resumes. On
    /// failure every stored token is cleared.
    ///
    /// # Errors
    ///
    /// The gateway's error, or [`ApiError::Storage`] when the new pair could
    /// not be persisted. All concurrent waiters receive the same error.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let refresh = self.join_or_start(refresh_token);
        let result = refresh.clone().await;

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&refresh)) {
            *slot = None;
        }
        result
    }

    /// Whether a refresh is currently pending.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    fn join_or_start(&self, refresh_token: &str) -> SharedRefresh {
        let mut slot = self.in_flight.lock();
        if let Some(existing) = slot.as_ref() {
            debug!("joining in-flight token refresh");
            return existing.clone();
        }

        let gateway = Arc::clone(&self.gateway);
        let tokens = Arc::clone(&self.tokens);
        let refresh_token = refresh_token.to_string();
        let refresh = async move {
            let outcome = match gateway.refresh(&refresh_token).await {
                Ok(mut pair) => {
                    if pair.refresh_token.is_none() {
                        pair.refresh_token = Some(refresh_token);
                    }
                    tokens.store_pair(&pair).map(|()| pair).map_err(ApiError::from)
                }
                Err(err) => Err(err),
            };
            match &outcome {
                Ok(_) => info!("access token refreshed"),
                Err(err) => {
                    warn!(error = %err, "token refresh failed, clearing stored tokens");
                    tokens.clear_all();
                }
            }
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(refresh.clone());
        refresh
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").field("refreshing", &self.is_refreshing()).finish()
    }
}
