//! One HTTP attempt
//!
//! [`RequestExecutor`] turns a [`RequestDescriptor`] plus the headers for
//! this attempt into exactly one transport call, bounded by a timeout and a
//! caller-owned [`CancellationToken`], and classifies the outcome into
//! [`ApiError`]. Nothing downstream re-classifies.

use std::sync::Arc;
use std::time::Duration;

use feedwire_core::csrf::is_csrf_failure;
use feedwire_core::{HttpTransport, RequestDescriptor, TransportError, TransportRequest};
use feedwire_domain::constants::{
    AUTHORIZATION_HEADER, BEARER_PREFIX, CONTENT_TYPE_HEADER, CSRF_HEADER, JSON_CONTENT_TYPE,
};
use feedwire_domain::{ApiError, CsrfToken};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Successful (2xx) attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub status: u16,
    /// Decoded body; `Value::Null` for empty bodies and 204/205.
    pub data: Value,
    /// Fresh CSRF token from the `X-CSRF-Token` response header.
    pub csrf_token: Option<CsrfToken>,
}

/// Executes single attempts against `base_url`.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { transport, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}{endpoint}`
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') || endpoint.is_empty() {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    /// Headers for one attempt.
    ///
    /// Caller headers never override `Authorization` or `X-CSRF-Token`; a
    /// caller `Content-Type` replaces the JSON default. The CSRF header is
    /// attached to state-changing methods only.
    pub fn build_headers(
        request: &RequestDescriptor,
        access_token: Option<&str>,
        csrf_token: Option<&CsrfToken>,
    ) -> Vec<(String, String)> {
        let mut content_type = JSON_CONTENT_TYPE.to_string();
        let mut custom = Vec::with_capacity(request.headers().len());
        for (name, value) in request.headers() {
            if name.eq_ignore_ascii_case(AUTHORIZATION_HEADER)
                || name.eq_ignore_ascii_case(CSRF_HEADER)
            {
                debug!(header = %name, "ignoring caller-supplied protected header");
            } else if name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
                content_type.clone_from(value);
            } else {
                custom.push((name.clone(), value.clone()));
            }
        }

        let mut headers = vec![(CONTENT_TYPE_HEADER.to_string(), content_type)];
        if request.requires_auth() {
            if let Some(token) = access_token.filter(|token| !token.is_empty()) {
                headers.push((AUTHORIZATION_HEADER.to_string(), format!("{BEARER_PREFIX}{token}")));
            }
        }
        headers.extend(custom);
        if request.method().is_state_changing() {
            if let Some(token) = csrf_token {
                headers.push((CSRF_HEADER.to_string(), token.as_str().to_string()));
            }
        }
        headers
    }

    /// Run one attempt.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Timeout`] when `timeout` elapses first
    /// - [`ApiError::Cancelled`] when `cancel` fires first
    /// - [`ApiError::Network`] / [`ApiError::Config`] from the transport
    /// - the classification of any non-2xx status (see [`classify_status`])
    /// - [`ApiError::InvalidResponse`] for a 2xx body that is not JSON
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        headers: Vec<(String, String)>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome, ApiError> {
        let body = request
            .body()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| ApiError::Config(format!("failed to serialize request body: {err}")))?;
        let transport_request = TransportRequest {
            method: request.method(),
            url: self.url_for(request.endpoint()),
            headers,
            body,
        };

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            sent = tokio::time::timeout(timeout, self.transport.send(transport_request)) => {
                match sent {
                    Err(_elapsed) => {
                        warn!(endpoint = %request.endpoint(), ?timeout, "request timed out");
                        return Err(ApiError::Timeout(timeout));
                    }
                    Ok(Err(err)) => return Err(classify_transport(&err)),
                    Ok(Ok(response)) => response,
                }
            }
        };

        if !response.is_success() {
            return Err(classify_status(response.status, &response.body));
        }

        let csrf_token = response
            .header(CSRF_HEADER)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(CsrfToken::new);
        let data = parse_body(request.endpoint(), response.status, &response.body)?;
        Ok(AttemptOutcome { status: response.status, data, csrf_token })
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

/// Classify a non-2xx response.
///
/// 401 is always [`ApiError::Auth`]; a 403 carrying the CSRF failure
/// signature is [`ApiError::Csrf`]; everything else is [`ApiError::Http`]
/// with the server's `message` (or `error`) and `details`, falling back to
/// a generic message when the body is not JSON.
pub fn classify_status(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let server_message = parsed.as_ref().and_then(|json| {
        json.get("message").or_else(|| json.get("error")).and_then(Value::as_str).map(str::to_string)
    });
    let message = server_message.unwrap_or_else(|| ApiError::fallback_message(status));

    if status == 401 {
        return ApiError::Auth { message };
    }
    if is_csrf_failure(status, body) {
        return ApiError::Csrf { message };
    }
    let details = parsed.and_then(|mut json| json.get_mut("details").map(Value::take));
    ApiError::Http { status, message, details }
}

/// Classify a failure where no response was received.
pub fn classify_transport(err: &TransportError) -> ApiError {
    match err {
        TransportError::Connection(message) => ApiError::Network(message.clone()),
        TransportError::InvalidRequest(message) => ApiError::Config(message.clone()),
    }
}

fn parse_body(endpoint: &str, status: u16, body: &str) -> Result<Value, ApiError> {
    if status == 204 || status == 205 || body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: format!("response body is not valid JSON: {err}"),
    })
}
