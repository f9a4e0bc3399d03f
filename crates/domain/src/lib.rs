//! # Feedwire Domain
//!
//! Domain types shared by every Feedwire crate.
//!
//! This crate contains:
//! - The API error taxonomy (`ApiError`, `ApiErrorKind`) and the workspace
//!   error type (`FeedwireError`)
//! - Token and CSRF value types
//! - Client configuration structures
//! - Wire constants (header names, storage keys, cookie attributes)
//!
//! ## Architecture
//! - No dependencies on other Feedwire crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
