//! axum middleware enforcing the double submit
//!
//! ```ignore
//! let protocol = Arc::new(CsrfProtocol::production());
//! let app = Router::new()
//!     .route("/feeds", post(create_feed))
//!     .layer(axum::middleware::from_fn_with_state(protocol, csrf_protection));
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feedwire_domain::constants::LOGIN_PATH;
use serde_json::json;
use tracing::{debug, error, warn};

use super::protocol::CsrfProtocol;

/// Error body of a rejected request.
pub const CSRF_REJECTION_MESSAGE: &str = "CSRF token validation failed";

fn is_state_changing(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

/// Rejects state-changing requests that fail the double submit with 403,
/// and issues a fresh token on responses to authenticated requests and to
/// the login endpoint.
pub async fn csrf_protection(
    State(protocol): State<Arc<CsrfProtocol>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if is_state_changing(&method) && !protocol.validate(req.headers()) {
        warn!(%method, %path, "rejecting request with invalid CSRF token");
        return (StatusCode::FORBIDDEN, Json(json!({ "error": CSRF_REJECTION_MESSAGE })))
            .into_response();
    }

    let issue_token =
        req.headers().contains_key(header::AUTHORIZATION) || path.ends_with(LOGIN_PATH);

    let mut response = next.run(req).await;

    if issue_token {
        let token = protocol.generate();
        match protocol.attach(response.headers_mut(), &token) {
            Ok(()) => debug!(%path, "issued CSRF token"),
            Err(err) => error!(%path, error = %err, "failed to attach CSRF token"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let protocol = Arc::new(CsrfProtocol::development());
        Router::new()
            .route("/feeds", get(|| async { "list" }).post(|| async { "created" }))
            .route("/auth/login", post(|| async { "welcome" }))
            .layer(axum::middleware::from_fn_with_state(protocol, csrf_protection))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn safe_methods_pass_without_tokens() {
        let response = app()
            .oneshot(Request::get("/feeds").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn post_without_tokens_is_rejected() {
        let response = app()
            .oneshot(Request::post("/feeds").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, r#"{"error":"CSRF token validation failed"}"#);
    }

    #[tokio::test]
    async fn matching_pair_is_accepted_and_rotated() {
        let token = "t".repeat(43);
        let request = Request::post("/feeds")
            .header(header::COOKIE, format!("csrf_token={token}"))
            .header("X-CSRF-Token", token.as_str())
            .header(header::AUTHORIZATION, "Bearer access")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let rotated = response.headers().get("x-csrf-token").unwrap();
        assert_ne!(rotated, &HeaderValue::from_str(&token).unwrap());
        assert_eq!(rotated.len(), 43);
        assert_eq!(body_text(response).await, "created");
    }

    #[tokio::test]
    async fn login_responses_carry_a_fresh_token() {
        let token = "l".repeat(43);
        let request = Request::post("/auth/login")
            .header(header::COOKIE, format!("csrf_token={token}"))
            .header("X-CSRF-Token", token.as_str())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("csrf_token="));
        assert!(!cookie.contains("Secure"));
    }
}
