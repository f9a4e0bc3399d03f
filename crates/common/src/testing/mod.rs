//! Testing utilities and helpers
//!
//! - **[`time`]**: clock abstraction with a controllable mock
//!
//! The [`Clock`] trait is also what production code depends on for "now";
//! [`SystemClock`] is the default everywhere.

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
