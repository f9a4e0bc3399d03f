//! Wire and storage constants
//!
//! Centralized location for every header name, cookie attribute and storage
//! key the client and server halves agree on.

// HTTP headers
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const BEARER_PREFIX: &str = "Bearer ";

// CSRF cookie
pub const CSRF_COOKIE_NAME: &str = "csrf_token";
pub const CSRF_COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;
pub const CSRF_COOKIE_PATH: &str = "/";
/// Random bytes drawn per CSRF token (256 bits).
pub const CSRF_TOKEN_BYTES: usize = 32;
/// Length of a base64url (unpadded) encoding of `CSRF_TOKEN_BYTES`.
pub const CSRF_TOKEN_LENGTH: usize = 43;

// Client storage keys
pub const TOKEN_STORAGE_KEY: &str = "feedwire.auth.tokens";
pub const CSRF_TOKEN_STORAGE_KEY: &str = "feedwire.csrf.token";
pub const CSRF_RELOAD_STORAGE_KEY: &str = "feedwire.csrf.last_reload";
pub const CSRF_ERROR_FLAG_KEY: &str = "feedwire.csrf.error";

/// Minimum spacing between two CSRF-triggered page reloads.
pub const CSRF_RELOAD_GRACE_MS: u64 = 5_000;

// Navigation
pub const LOGIN_PATH: &str = "/login";

// Auth endpoints, relative to the API base URL
pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REFRESH_ENDPOINT: &str = "/auth/refresh";

// Client defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_GRACE_SECS: i64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 0;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 10_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// Telemetry event names
pub const EVENT_API_REQUEST: &str = "api.request";
pub const EVENT_API_RETRY: &str = "api.retry";
pub const EVENT_AUTH_REFRESH: &str = "auth.refresh";
pub const EVENT_CSRF_FAILURE: &str = "csrf.failure";
