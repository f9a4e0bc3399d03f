//! Modular common utilities shared across Feedwire crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: crypto helpers, JWT claim decoding, backoff math
//! - `runtime`: key-value storage and the clock abstraction
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod crypto;
#[cfg(feature = "foundation")]
pub mod resilience;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::jwt::{decode_claims, JwtError};
#[cfg(feature = "foundation")]
pub use crypto::{base64url_decode, base64url_encode, random_bytes, timing_safe_eq};
#[cfg(feature = "foundation")]
pub use resilience::BackoffStrategy;
#[cfg(feature = "runtime")]
pub use storage::{KeyValueStorage, MemoryStorage, StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use testing::{Clock, MockClock, SystemClock};
