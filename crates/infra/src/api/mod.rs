//! Feed API client
//!
//! [`ApiClient`] is the entry point the UI layer calls; [`HttpAuthGateway`]
//! talks to the login and refresh endpoints on its behalf.

pub mod auth;
pub mod client;

pub use auth::HttpAuthGateway;
pub use client::{ApiClient, ApiClientBuilder};
