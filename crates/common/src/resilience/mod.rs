//! Resilience building blocks.
//!
//! Only the delay math lives here; the decision of *whether* to retry
//! belongs to the caller, which knows how its errors are classified.

pub mod backoff;

pub use backoff::BackoffStrategy;
