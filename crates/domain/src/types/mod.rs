//! Domain value types
//!
//! Request-side vocabulary (`HttpMethod`), the token pair owned by the token
//! store and the CSRF value types shared by client and server.

pub mod auth;
pub mod csrf;
pub mod http;

pub use auth::{TokenClaims, TokenPair};
pub use csrf::{CsrfToken, ReloadGuard, SameSite};
pub use http::HttpMethod;
