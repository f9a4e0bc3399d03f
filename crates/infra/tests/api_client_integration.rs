//! Integration tests for the API client lifecycle
//!
//! Drives [`ApiClient`](feedwire_infra::ApiClient) through a scripted
//! transport so attempt counts, headers and side effects can be asserted
//! exactly.

mod support;

use std::sync::Arc;
use std::time::Duration;

use feedwire_core::{ListResponseValidator, RequestDescriptor, RetryPolicy, TransportResponse};
use feedwire_domain::constants::{CSRF_HEADER, LOGIN_PATH};
use feedwire_domain::{ApiError, ApiErrorKind, ClientConfig, CsrfToken, TokenPair};
use serde_json::{json, Value};
use support::{
    connection_refused, harness, harness_with, harness_with_http_auth, jwt_expiring_in, ok,
    status, test_config, CountingGateway, ScriptedTransport,
};

const CSRF_REJECTION: &str = r#"{"error":"CSRF token validation failed"}"#;

/// Validates that a transient network failure is retried and the retry
/// succeeds.
///
/// Assertions:
/// - Exactly two transport calls for one logical request
/// - The successful body is returned
/// - One `api.retry` event is recorded
#[tokio::test(start_paused = true)]
async fn network_failure_then_success_makes_two_calls() {
    let transport = ScriptedTransport::new(vec![connection_refused(), ok(r#"{"id":1}"#)]);
    let h = harness(test_config(3), transport);

    let body: Value = h.client.get("/feeds/1").await.unwrap();

    assert_eq!(body, json!({"id": 1}));
    assert_eq!(h.transport.calls(), 2);
    assert_eq!(h.recorder.names().iter().filter(|n| *n == "api.retry").count(), 1);
    assert_eq!(h.recorder.tag("api.request", "outcome").as_deref(), Some("success"));
}

/// Validates that the retry budget bounds the number of attempts.
///
/// Assertions:
/// - `max_retries = 3` yields four attempts against a persistent 500
/// - The final error is the last classified server error
#[tokio::test(start_paused = true)]
async fn server_errors_exhaust_the_retry_budget() {
    let transport = ScriptedTransport::new(vec![
        status(500, "{}"),
        status(502, "{}"),
        status(503, "{}"),
        status(504, r#"{"message":"gateway timeout"}"#),
        ok("{}"),
    ]);
    let h = harness(test_config(3), transport);

    let err = h.client.get::<Value>("/feeds").await.unwrap_err();

    assert_eq!(h.transport.calls(), 4);
    assert_eq!(err.status(), Some(504));
    assert!(err.is_server_error());
    assert_eq!(err.to_string(), "gateway timeout");
    assert_eq!(h.recorder.tag("api.request", "outcome").as_deref(), Some("server"));
}

/// Validates that client errors are never retried even with a budget.
#[tokio::test(start_paused = true)]
async fn client_error_makes_exactly_one_call() {
    let transport = ScriptedTransport::new(vec![status(400, r#"{"message":"bad"}"#)]);
    let h = harness(test_config(3), transport);

    let err = h.client.get::<Value>("/feeds").await.unwrap_err();

    assert_eq!(h.transport.calls(), 1);
    assert_eq!(err.kind(), ApiErrorKind::Client);
}

/// Validates that retries are disabled by default.
#[tokio::test(start_paused = true)]
async fn default_policy_does_not_retry() {
    let transport = ScriptedTransport::new(vec![status(503, ""), ok("{}")]);
    let config = ClientConfig { base_url: "https://api.test".into(), ..ClientConfig::default() };
    let h = harness(config, transport);

    let err = h.client.get::<Value>("/feeds").await.unwrap_err();

    assert_eq!(h.transport.calls(), 1);
    assert_eq!(err.status(), Some(503));
}

/// Validates that a per-request policy overrides the client default.
#[tokio::test(start_paused = true)]
async fn request_policy_overrides_client_default() {
    let transport = ScriptedTransport::new(vec![connection_refused(), ok(r#""done""#)]);
    let h = harness(test_config(0), transport);

    let request = RequestDescriptor::post("/feeds/refresh-all")
        .with_retry(RetryPolicy::with_max_retries(1));
    let body: String = h.client.request(request).await.unwrap();

    assert_eq!(body, "done");
    assert_eq!(h.transport.calls(), 2);
}

/// Validates that timeouts abandon the attempt and are retryable.
///
/// Assertions:
/// - Each attempt ends at the request timeout, not the transport delay
/// - The final error is `Timeout` carrying the configured duration
#[tokio::test(start_paused = true)]
async fn timeouts_are_classified_and_retried() {
    let transport = ScriptedTransport::with_delay(Vec::new(), Duration::from_secs(60));
    let h = harness(test_config(1), transport);

    let started = tokio::time::Instant::now();
    let request = RequestDescriptor::get("/slow").with_timeout(Duration::from_millis(200));
    let err = h.client.request_value(request).await.unwrap_err();

    assert_eq!(err, ApiError::Timeout(Duration::from_millis(200)));
    assert_eq!(h.transport.calls(), 2);
    assert!(started.elapsed() < Duration::from_secs(60));
}

/// Validates the 401 path: session teardown and redirect, no retry.
///
/// Assertions:
/// - Both tokens are cleared
/// - The navigator is sent to the login page once
/// - Only one attempt is made despite a retry budget
#[tokio::test(start_paused = true)]
async fn unauthorized_clears_tokens_and_redirects() {
    let transport = ScriptedTransport::new(vec![status(401, r#"{"message":"Token expired"}"#)]);
    let h = harness(test_config(3), transport);
    h.client.tokens().store_pair(&TokenPair::new("access", Some("refresh".into()))).unwrap();

    let err = h.client.get::<Value>("/me").await.unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(err.status(), Some(401));
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.client.tokens().get(), None);
    assert_eq!(h.client.tokens().get_refresh_token(), None);
    assert_eq!(*h.navigator.redirects.lock(), vec![LOGIN_PATH.to_string()]);
}

/// Validates the CSRF header rule on the wire.
///
/// Assertions:
/// - GET carries no `X-CSRF-Token`
/// - POST, PUT, PATCH and DELETE carry the stored token
#[tokio::test]
async fn csrf_header_on_state_changing_methods_only() {
    let transport = ScriptedTransport::new(Vec::new());
    let h = harness(test_config(0), transport);
    let token = CsrfToken::new("t".repeat(43));
    h.client.csrf_store().set(&token).unwrap();

    let _: Value = h.client.get("/feeds").await.unwrap();
    let _: Value = h.client.post("/feeds", &json!({"url": "u"})).await.unwrap();
    let _: Value = h.client.put("/feeds/1", &json!({"title": "t"})).await.unwrap();
    let _: Value = h.client.patch("/feeds/1", &json!({"title": "t"})).await.unwrap();
    let _: Value = h.client.delete("/feeds/1").await.unwrap();

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[0].header(CSRF_HEADER), None);
    for request in &requests[1..] {
        assert_eq!(request.header(CSRF_HEADER), Some(token.as_str()), "{:?}", request.method);
    }
}

/// Validates that a fresh token on a response replaces the stored one and
/// is used by the next state-changing request.
#[tokio::test]
async fn csrf_token_rotates_from_response_header() {
    let rotated = "r".repeat(43);
    let transport = ScriptedTransport::new(vec![
        Ok(TransportResponse::new(200, "{}").with_header("X-CSRF-Token", rotated.clone())),
        ok("{}"),
    ]);
    let h = harness(test_config(0), transport);
    h.client.csrf_store().set(&CsrfToken::new("old")).unwrap();

    let _: Value = h.client.get("/session").await.unwrap();
    let _: Value = h.client.post("/feeds", &json!({})).await.unwrap();

    assert_eq!(h.client.csrf_store().get(), Some(CsrfToken::new(rotated.clone())));
    assert_eq!(h.transport.requests()[1].header(CSRF_HEADER), Some(rotated.as_str()));
}

/// Validates CSRF recovery and the reload grace window.
///
/// Assertions:
/// - A CSRF 403 is `Csrf` with status 403 and is not retried
/// - The cached token is cleared and the error flag set
/// - A second failure within 5 s does not reload again
/// - A failure after the window reloads again
#[tokio::test(start_paused = true)]
async fn csrf_rejection_recovers_with_bounded_reloads() {
    let transport = ScriptedTransport::new(vec![
        status(403, CSRF_REJECTION),
        status(403, CSRF_REJECTION),
        status(403, CSRF_REJECTION),
    ]);
    let h = harness(test_config(3), transport);
    h.client.csrf_store().set(&CsrfToken::new("stale")).unwrap();

    let err = h.client.post::<_, Value>("/feeds", &json!({})).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Csrf);
    assert_eq!(err.status(), Some(403));
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.client.csrf_store().get(), None);
    assert!(h.client.csrf_store().has_error());
    assert_eq!(h.navigator.reload_count(), 1);

    h.clock.advance(Duration::from_millis(4_999));
    let _ = h.client.post::<_, Value>("/feeds", &json!({})).await.unwrap_err();
    assert_eq!(h.navigator.reload_count(), 1);
    assert_eq!(h.recorder.tag("csrf.failure", "outcome").as_deref(), Some("suppressed"));

    h.clock.advance(Duration::from_millis(1));
    let _ = h.client.post::<_, Value>("/feeds", &json!({})).await.unwrap_err();
    assert_eq!(h.navigator.reload_count(), 2);
}

/// Validates that a plain 403 is an ordinary client error.
#[tokio::test]
async fn plain_forbidden_is_not_csrf() {
    let transport =
        ScriptedTransport::new(vec![status(403, r#"{"message":"Insufficient permissions"}"#)]);
    let h = harness(test_config(0), transport);
    h.client.csrf_store().set(&CsrfToken::new("kept")).unwrap();

    let err = h.client.delete::<Value>("/feeds/9").await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Client);
    assert_eq!(h.client.csrf_store().get(), Some(CsrfToken::new("kept")));
    assert_eq!(h.navigator.reload_count(), 0);
}

/// Validates single-flight refresh across concurrent requests.
///
/// Assertions:
/// - Three concurrent requests with an expiring token trigger one refresh
/// - Every request is sent with the refreshed token
/// - The refresh token is kept when the response omits it
#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let config = ClientConfig { token_refresh_enabled: true, ..test_config(0) };
    let h = harness(config, ScriptedTransport::new(Vec::new()));
    h.client
        .tokens()
        .store_pair(&TokenPair::new(jwt_expiring_in(30), Some("refresh-1".into())))
        .unwrap();

    let (a, b, c) = tokio::join!(
        h.client.get::<Value>("/feeds"),
        h.client.get::<Value>("/folders"),
        h.client.get::<Value>("/me"),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(h.gateway.refresh_count(), 1);
    let refreshed = h.client.tokens().get().unwrap();
    assert_ne!(refreshed, jwt_expiring_in(30));
    let expected = format!("Bearer {refreshed}");
    for request in h.transport.requests() {
        assert_eq!(request.header("Authorization"), Some(expected.as_str()));
    }
    assert_eq!(h.client.tokens().get_refresh_token().as_deref(), Some("refresh-1"));
    assert_eq!(h.recorder.tag("auth.refresh", "outcome").as_deref(), Some("success"));
}

/// Validates that refresh is skipped while the token is comfortably valid
/// or the feature is off.
#[tokio::test]
async fn refresh_only_when_enabled_and_expiring() {
    let fresh = ClientConfig { token_refresh_enabled: true, ..test_config(0) };
    let h = harness(fresh, ScriptedTransport::new(Vec::new()));
    h.client
        .tokens()
        .store_pair(&TokenPair::new(jwt_expiring_in(3_600), Some("r".into())))
        .unwrap();
    let _: Value = h.client.get("/feeds").await.unwrap();
    assert_eq!(h.gateway.refresh_count(), 0);

    let disabled = harness(test_config(0), ScriptedTransport::new(Vec::new()));
    disabled
        .client
        .tokens()
        .store_pair(&TokenPair::new(jwt_expiring_in(5), Some("r".into())))
        .unwrap();
    let _: Value = disabled.client.get("/feeds").await.unwrap();
    assert_eq!(disabled.gateway.refresh_count(), 0);
}

/// Validates that a failed refresh clears the session and the request is
/// still attempted, without credentials.
#[tokio::test]
async fn failed_refresh_clears_tokens_and_proceeds() {
    let config = ClientConfig { token_refresh_enabled: true, ..test_config(0) };
    let gateway = CountingGateway { fail_refresh: true, ..CountingGateway::default() };
    let h = harness_with(config, ScriptedTransport::new(Vec::new()), gateway, |b| b);
    h.client
        .tokens()
        .store_pair(&TokenPair::new(jwt_expiring_in(10), Some("revoked".into())))
        .unwrap();

    let _: Value = h.client.get("/public-feeds").await.unwrap();

    assert_eq!(h.gateway.refresh_count(), 1);
    assert_eq!(h.client.tokens().get(), None);
    assert_eq!(h.transport.requests()[0].header("Authorization"), None);
    assert_eq!(h.recorder.tag("auth.refresh", "outcome").as_deref(), Some("failure"));
}

/// Validates that malformed tokens count as expiring and trigger a refresh.
#[tokio::test]
async fn malformed_token_is_refreshed() {
    let config = ClientConfig { token_refresh_enabled: true, ..test_config(0) };
    let h = harness(config, ScriptedTransport::new(Vec::new()));
    h.client.tokens().store_pair(&TokenPair::new("not-a-jwt", Some("r".into()))).unwrap();

    let _: Value = h.client.get("/feeds").await.unwrap();

    assert_eq!(h.gateway.refresh_count(), 1);
}

/// Validates that `cancel_pending` aborts in-flight requests only.
#[tokio::test(start_paused = true)]
async fn cancel_pending_aborts_in_flight_requests() {
    let transport = ScriptedTransport::with_delay(Vec::new(), Duration::from_secs(10));
    let h = harness(test_config(0), transport);

    let (result, ()) = tokio::join!(h.client.get::<Value>("/slow"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.client.cancel_pending();
    });
    assert_eq!(result.unwrap_err(), ApiError::Cancelled);
    assert_eq!(h.recorder.tag("api.request", "outcome").as_deref(), Some("cancelled"));

    let later: Value = h.client.get("/slow").await.unwrap();
    assert_eq!(later, json!({}));
}

struct RequiresItems;

impl ListResponseValidator for RequiresItems {
    fn validate(&self, raw: &Value, _endpoint_name: &str) -> bool {
        raw.get("items").is_some_and(Value::is_array)
    }
}

/// Validates list-shape validation in `fetch_list`.
#[tokio::test]
async fn fetch_list_rejects_unexpected_shapes() {
    let transport = ScriptedTransport::new(vec![
        ok(r#"{"items":[{"id":1}],"total":1}"#),
        ok(r#"{"data":[]}"#),
    ]);
    let h = harness_with(test_config(0), transport, CountingGateway::default(), |b| {
        b.validator(Arc::new(RequiresItems))
    });

    let page: Value = h.client.fetch_list("/feeds", "feeds").await.unwrap();
    assert_eq!(page["total"], 1);

    let err = h.client.fetch_list::<Value>("/feeds", "feeds").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::InvalidResponse {
            endpoint: "feeds".into(),
            message: "response does not match the expected list shape".into(),
        }
    );
}

/// Validates that login persists the token pair used by later requests.
#[tokio::test]
async fn login_persists_tokens() {
    let h = harness(test_config(0), ScriptedTransport::new(Vec::new()));

    h.client.login("reader@example.com", "secret").await.unwrap();

    assert_eq!(h.client.tokens().get_refresh_token().as_deref(), Some("refresh-login"));
    let _: Value = h.client.get("/me").await.unwrap();
    let auth = h.transport.requests()[0].header("Authorization").map(str::to_string);
    assert_eq!(auth, h.client.tokens().get().map(|t| format!("Bearer {t}")));
}

/// Validates CSRF recovery when the login POST itself is rejected.
///
/// Assertions:
/// - The caller gets `Csrf`
/// - The stale token is dropped and the error flag set
/// - One guarded reload; a second rejected login inside the window does
///   not reload again and does not resend the stale token
#[tokio::test]
async fn csrf_rejection_on_login_recovers() {
    let transport =
        ScriptedTransport::new(vec![status(403, CSRF_REJECTION), status(403, CSRF_REJECTION)]);
    let h = harness_with_http_auth(test_config(0), transport);
    h.client.csrf_store().set(&CsrfToken::new("stale")).unwrap();

    let err = h.client.login("reader@example.com", "pw").await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Csrf);
    assert_eq!(h.client.csrf_store().get(), None);
    assert!(h.client.csrf_store().has_error());
    assert_eq!(h.navigator.reload_count(), 1);
    assert_eq!(h.client.tokens().get(), None);
    assert_eq!(h.recorder.tag("csrf.failure", "endpoint").as_deref(), Some("/auth/login"));

    let _ = h.client.login("reader@example.com", "pw").await.unwrap_err();
    assert_eq!(h.navigator.reload_count(), 1);
    let requests = h.transport.requests();
    assert_eq!(requests[0].header(CSRF_HEADER), Some("stale"));
    assert_eq!(requests[1].header(CSRF_HEADER), None);
}

/// Validates CSRF recovery when the proactive refresh is rejected.
///
/// Assertions:
/// - Refresh failure clears the tokens and the request still goes out
/// - The rejected CSRF token is dropped and a reload is requested
#[tokio::test]
async fn csrf_rejection_on_refresh_recovers() {
    let transport = ScriptedTransport::new(vec![status(403, CSRF_REJECTION), ok(r#"{"id":1}"#)]);
    let config = ClientConfig { token_refresh_enabled: true, ..test_config(0) };
    let h = harness_with_http_auth(config, transport);
    h.client.tokens().store_pair(&TokenPair::new(jwt_expiring_in(10), Some("r1".into()))).unwrap();
    h.client.csrf_store().set(&CsrfToken::new("stale")).unwrap();

    let body: Value = h.client.get("/feeds/1").await.unwrap();

    assert_eq!(body, json!({"id": 1}));
    assert_eq!(h.transport.calls(), 2);
    assert_eq!(h.client.tokens().get(), None);
    assert_eq!(h.client.csrf_store().get(), None);
    assert!(h.client.csrf_store().has_error());
    assert_eq!(h.navigator.reload_count(), 1);
    assert_eq!(h.recorder.tag("csrf.failure", "endpoint").as_deref(), Some("/auth/refresh"));
}
