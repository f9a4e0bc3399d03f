//! Server side of the CSRF double-submit-cookie protocol
//!
//! The server issues a random token twice: as an `HttpOnly` cookie the
//! browser replays automatically, and as an `X-CSRF-Token` response header
//! the client copies into state-changing requests. A request is accepted
//! only when both copies are present and equal.

pub mod cookie;
pub mod middleware;
pub mod protocol;

pub use cookie::{extract_cookie, CsrfConfig};
pub use middleware::{csrf_protection, CSRF_REJECTION_MESSAGE};
pub use protocol::CsrfProtocol;
