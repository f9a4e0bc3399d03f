//! API client
//!
//! Runs the full lifecycle of one logical call: optional proactive token
//! refresh, attempts through the [`RequestExecutor`], CSRF rotation on
//! success, session teardown on 401, CSRF recovery on a rejected token, and
//! retry with backoff for transient failures.

use std::sync::Arc;
use std::time::Instant;

use feedwire_common::{Clock, KeyValueStorage, MemoryStorage, SystemClock};
use feedwire_core::{
    AcceptAllValidator, AuthGateway, CsrfRecovery, CsrfTokenStore, EventRecorder, HttpTransport,
    ListResponseValidator, Navigator, NoopEventRecorder, NoopNavigator, RecoveryOutcome,
    RefreshCoordinator, RequestDescriptor, RetryPolicy, TokenStore,
};
use feedwire_domain::constants::{
    EVENT_API_REQUEST, EVENT_API_RETRY, EVENT_AUTH_REFRESH, EVENT_CSRF_FAILURE, LOGIN_ENDPOINT,
    LOGIN_PATH, REFRESH_ENDPOINT,
};
use feedwire_domain::{ApiError, ClientConfig, CsrfToken, FeedwireError, TokenPair};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::auth::HttpAuthGateway;
use crate::http::{ReqwestTransport, RequestExecutor};

/// Typed client for the feed API.
pub struct ApiClient {
    config: ClientConfig,
    executor: RequestExecutor,
    tokens: Arc<TokenStore>,
    csrf: Arc<CsrfTokenStore>,
    csrf_recovery: CsrfRecovery,
    auth_gateway: Arc<dyn AuthGateway>,
    refresh: RefreshCoordinator,
    navigator: Arc<dyn Navigator>,
    recorder: Arc<dyn EventRecorder>,
    validator: Arc<dyn ListResponseValidator>,
    default_retry: RetryPolicy,
    cancel_root: Mutex<CancellationToken>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client with default collaborators over `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] for an invalid configuration or if
    /// the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, FeedwireError> {
        Self::builder().config(config).build()
    }

    /// Configuration the client was built with.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared token store, e.g. for an auth guard in the UI.
    pub const fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Session-scoped CSRF state.
    pub const fn csrf_store(&self) -> &Arc<CsrfTokenStore> {
        &self.csrf
    }

    /// Execute a request and return the decoded JSON body.
    ///
    /// # Errors
    ///
    /// The classified [`ApiError`] of the last attempt, or
    /// [`ApiError::Cancelled`] after [`cancel_pending`](Self::cancel_pending).
    #[instrument(
        skip(self, request),
        fields(
            request_id = %uuid::Uuid::new_v4(),
            endpoint = %request.endpoint(),
            method = %request.method(),
        )
    )]
    pub async fn request_value(&self, request: RequestDescriptor) -> Result<Value, ApiError> {
        let started = Instant::now();
        let cancel = self.cancel_root.lock().child_token();

        let result = self.run(&request, &cancel).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind().as_str(),
        };
        self.recorder.record_event(
            EVENT_API_REQUEST,
            started.elapsed().as_secs_f64() * 1000.0,
            &[
                ("endpoint", request.endpoint()),
                ("method", request.method().as_str()),
                ("outcome", outcome),
            ],
        );
        match &result {
            Ok(_) => debug!("request succeeded"),
            Err(err) => warn!(error = %err, kind = %err.kind(), "request failed"),
        }
        result
    }

    /// Execute a request and deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// See [`request_value`](Self::request_value);
    /// [`ApiError::InvalidResponse`] when the body does not match `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let endpoint = request.endpoint().to_string();
        let value = self.request_value(request).await?;
        decode(&endpoint, value)
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(RequestDescriptor::get(endpoint)).await
    }

    /// # Errors
    ///
    /// [`ApiError::Config`] if `body` cannot be serialized, otherwise see
    /// [`request`](Self::request).
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestDescriptor::post(endpoint).with_body(encode(body)?)).await
    }

    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestDescriptor::put(endpoint).with_body(encode(body)?)).await
    }

    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestDescriptor::patch(endpoint).with_body(encode(body)?)).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(RequestDescriptor::delete(endpoint)).await
    }

    /// GET a list endpoint and check its shape before decoding.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidResponse`] when the validator rejects the body for
    /// `endpoint_name` or it does not decode into `T`.
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        endpoint_name: &str,
    ) -> Result<T, ApiError> {
        let raw = self.request_value(RequestDescriptor::get(endpoint)).await?;
        if !self.validator.validate(&raw, endpoint_name) {
            warn!(endpoint = %endpoint, endpoint_name, "list response failed shape validation");
            return Err(ApiError::InvalidResponse {
                endpoint: endpoint_name.to_string(),
                message: "response does not match the expected list shape".into(),
            });
        }
        decode(endpoint_name, raw)
    }

    /// Exchange credentials for a token pair and persist it.
    ///
    /// # Errors
    ///
    /// The gateway's error, or [`ApiError::Storage`] if the pair cannot be
    /// persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let pair: TokenPair = match self.auth_gateway.login(email, password).await {
            Ok(pair) => pair,
            Err(err) => {
                if matches!(err, ApiError::Csrf { .. }) {
                    self.recover_csrf(LOGIN_ENDPOINT);
                }
                return Err(err);
            }
        };
        self.tokens.store_pair(&pair)?;
        self.csrf.clear_error();
        info!("session established");
        Ok(())
    }

    /// Drop the session: both tokens and the cached CSRF token.
    pub fn logout(&self) {
        self.tokens.clear_all();
        self.csrf.clear();
        info!("session cleared");
    }

    /// Cancel every request currently in flight. Later requests are not
    /// affected.
    pub fn cancel_pending(&self) {
        let mut root = self.cancel_root.lock();
        root.cancel();
        *root = CancellationToken::new();
    }

    async fn run(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Value, ApiError> {
        if request.requires_auth() {
            self.maybe_refresh().await;
        }

        let policy = request.retry().unwrap_or(&self.default_retry);
        let timeout = request.timeout().unwrap_or_else(|| self.config.timeout());
        let mut attempt = 0u32;

        loop {
            let access_token = self.tokens.get();
            let csrf_token = self.csrf.get();
            let headers = RequestExecutor::build_headers(
                request,
                access_token.as_deref(),
                csrf_token.as_ref(),
            );

            let err = match self.executor.execute(request, headers, timeout, cancel).await {
                Ok(outcome) => {
                    if let Some(token) = outcome.csrf_token {
                        self.rotate_csrf(&token);
                    }
                    return Ok(outcome.data);
                }
                Err(err) => err,
            };

            self.handle_failure(request, &err);

            let decision = policy.decide(err.kind(), attempt);
            if !decision.should_retry {
                return Err(err);
            }
            attempt += 1;
            warn!(
                attempt,
                delay_ms = u64::try_from(decision.delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "retrying request"
            );
            self.recorder.record_event(
                EVENT_API_RETRY,
                f64::from(attempt),
                &[("endpoint", request.endpoint()), ("kind", err.kind().as_str())],
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ApiError::Cancelled),
                () = tokio::time::sleep(decision.delay) => {}
            }
        }
    }

    /// Refresh ahead of the request when the access token is about to
    /// expire. A failed refresh has already cleared the tokens; the request
    /// proceeds and surfaces the server's verdict.
    async fn maybe_refresh(&self) {
        if !self.config.token_refresh_enabled {
            return;
        }
        let Some(access_token) = self.tokens.get() else {
            return;
        };
        let Some(refresh_token) = self.tokens.get_refresh_token() else {
            return;
        };
        if !self.tokens.is_expiring_soon(&access_token, self.config.refresh_grace_seconds) {
            return;
        }

        let started = Instant::now();
        let result = self.refresh.refresh(&refresh_token).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        self.recorder.record_event(
            EVENT_AUTH_REFRESH,
            started.elapsed().as_secs_f64() * 1000.0,
            &[("outcome", outcome)],
        );
        if let Err(err) = result {
            warn!(error = %err, "proactive token refresh failed, continuing without it");
            if matches!(err, ApiError::Csrf { .. }) {
                self.recover_csrf(REFRESH_ENDPOINT);
            }
        }
    }

    fn handle_failure(&self, request: &RequestDescriptor, err: &ApiError) {
        match err {
            ApiError::Auth { .. } => {
                warn!(endpoint = %request.endpoint(), "unauthorized, clearing session");
                self.tokens.clear_all();
                self.navigator.redirect(LOGIN_PATH);
            }
            ApiError::Csrf { .. } => self.recover_csrf(request.endpoint()),
            _ => {}
        }
    }

    /// Drop the rejected CSRF token and reload at most once per grace window.
    fn recover_csrf(&self, endpoint: &str) {
        let outcome = match self.csrf_recovery.recover() {
            RecoveryOutcome::Reloaded => "reloaded",
            RecoveryOutcome::ReloadSuppressed => "suppressed",
        };
        self.recorder.record_event(
            EVENT_CSRF_FAILURE,
            1.0,
            &[("endpoint", endpoint), ("outcome", outcome)],
        );
    }

    fn rotate_csrf(&self, token: &CsrfToken) {
        match self.csrf.set(token) {
            Ok(()) => {
                self.csrf.clear_error();
                debug!("csrf token rotated");
            }
            Err(err) => warn!(error = %err, "failed to store rotated CSRF token"),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.executor.base_url())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Config(format!("failed to serialize request body: {err}")))
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: format!("failed to decode response: {err}"),
    })
}

/// Builder for [`ApiClient`].
///
/// Unset collaborators default to: reqwest transport, in-memory token and
/// session storage, the HTTP auth gateway, a no-op navigator and recorder,
/// and a validator that accepts every list.
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    token_storage: Option<Arc<dyn KeyValueStorage>>,
    session_storage: Option<Arc<dyn KeyValueStorage>>,
    auth_gateway: Option<Arc<dyn AuthGateway>>,
    navigator: Option<Arc<dyn Navigator>>,
    recorder: Option<Arc<dyn EventRecorder>>,
    validator: Option<Arc<dyn ListResponseValidator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ApiClientBuilder {
    /// Full client configuration. Validated in [`build`](Self::build).
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override only the base URL, keeping the other settings.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.get_or_insert_with(ClientConfig::default).base_url = base_url.into();
        self
    }

    /// HTTP transport; defaults to [`ReqwestTransport`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Persistent storage for the token pair.
    #[must_use]
    pub fn token_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.token_storage = Some(storage);
        self
    }

    /// Session-scoped storage for the CSRF token, reload guard and flag.
    #[must_use]
    pub fn session_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.session_storage = Some(storage);
        self
    }

    /// Login and refresh endpoints; defaults to [`HttpAuthGateway`].
    #[must_use]
    pub fn auth_gateway(mut self, gateway: Arc<dyn AuthGateway>) -> Self {
        self.auth_gateway = Some(gateway);
        self
    }

    /// Receiver of login redirects and CSRF reloads.
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sink for request, retry, refresh and CSRF events.
    #[must_use]
    pub fn event_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Shape check used by [`ApiClient::fetch_list`].
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn ListResponseValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Time source for token expiry and the reload guard.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wire the client, filling in defaults for unset collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] for an invalid configuration or if
    /// the default transport cannot be created.
    pub fn build(self) -> Result<ApiClient, FeedwireError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let token_storage =
            self.token_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let session_storage =
            self.session_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let tokens = Arc::new(TokenStore::new(token_storage).with_clock(Arc::clone(&clock)));
        let csrf = Arc::new(CsrfTokenStore::new(session_storage).with_clock(clock));
        let navigator: Arc<dyn Navigator> =
            self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator));
        let auth_gateway: Arc<dyn AuthGateway> = match self.auth_gateway {
            Some(gateway) => gateway,
            None => Arc::new(
                HttpAuthGateway::new(
                    RequestExecutor::new(Arc::clone(&transport), config.base_url.clone()),
                    config.timeout(),
                )
                .with_csrf_store(Arc::clone(&csrf)),
            ),
        };

        info!(base_url = %config.base_url, "API client configured");
        Ok(ApiClient {
            executor: RequestExecutor::new(transport, config.base_url.clone()),
            refresh: RefreshCoordinator::new(Arc::clone(&auth_gateway), Arc::clone(&tokens)),
            csrf_recovery: CsrfRecovery::new(Arc::clone(&csrf), Arc::clone(&navigator)),
            default_retry: RetryPolicy::from_settings(&config.retry),
            config,
            tokens,
            csrf,
            auth_gateway,
            navigator,
            recorder: self.recorder.unwrap_or_else(|| Arc::new(NoopEventRecorder)),
            validator: self.validator.unwrap_or_else(|| Arc::new(AcceptAllValidator)),
            cancel_root: Mutex::new(CancellationToken::new()),
        })
    }
}
