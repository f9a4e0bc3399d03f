//! HTTP implementation of the auth endpoints
//!
//! Login and refresh go straight through a [`RequestExecutor`], not through
//! the [`ApiClient`](super::ApiClient), so a failing refresh can never
//! recurse into another refresh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedwire_core::{AuthGateway, CsrfTokenStore, RequestDescriptor};
use feedwire_domain::constants::{LOGIN_ENDPOINT, REFRESH_ENDPOINT};
use feedwire_domain::{ApiError, TokenPair};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http::RequestExecutor;

/// [`AuthGateway`] over `POST /auth/login` and `POST /auth/refresh`.
pub struct HttpAuthGateway {
    executor: RequestExecutor,
    timeout: Duration,
    csrf: Option<Arc<CsrfTokenStore>>,
}

impl HttpAuthGateway {
    pub const fn new(executor: RequestExecutor, timeout: Duration) -> Self {
        Self { executor, timeout, csrf: None }
    }

    /// Send the stored CSRF token with auth calls and keep it rotated from
    /// their responses.
    #[must_use]
    pub fn with_csrf_store(mut self, csrf: Arc<CsrfTokenStore>) -> Self {
        self.csrf = Some(csrf);
        self
    }

    async fn exchange(&self, request: RequestDescriptor) -> Result<TokenPair, ApiError> {
        let csrf_token = self.csrf.as_ref().and_then(|store| store.get());
        let headers = RequestExecutor::build_headers(&request, None, csrf_token.as_ref());
        let outcome =
            self.executor.execute(&request, headers, self.timeout, &CancellationToken::new()).await?;

        if let (Some(store), Some(token)) = (self.csrf.as_ref(), outcome.csrf_token.as_ref()) {
            if let Err(err) = store.set(token) {
                warn!(error = %err, "failed to store rotated CSRF token");
            }
        }

        let pair: TokenPair =
            serde_json::from_value(outcome.data).map_err(|err| ApiError::InvalidResponse {
                endpoint: request.endpoint().to_string(),
                message: format!("unexpected token response: {err}"),
            })?;
        if pair.access_token.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::InvalidResponse {
                endpoint: request.endpoint().to_string(),
                message: "token response carries no access token".into(),
            });
        }
        Ok(pair)
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        debug!("submitting credentials");
        let request = RequestDescriptor::post(LOGIN_ENDPOINT)
            .with_auth(false)
            .with_body(json!({ "email": email, "password": password }));
        let pair = self.exchange(request).await?;
        info!("login succeeded");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let request = RequestDescriptor::post(REFRESH_ENDPOINT)
            .with_auth(false)
            .with_body(json!({ "refresh_token": refresh_token }));
        self.exchange(request).await
    }
}

impl std::fmt::Debug for HttpAuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthGateway")
            .field("executor", &self.executor)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
