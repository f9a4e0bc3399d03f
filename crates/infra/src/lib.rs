//! # Feedwire Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest transport, single-attempt executor and [`ApiClient`]
//! - The server-side CSRF protocol and its axum middleware
//! - Configuration loading from environment and files
//! - JSON-file persistent storage
//! - Tracing setup and the tracing-backed event recorder
//!
//! ## Architecture
//! - Implements traits defined in `feedwire-core`
//! - Contains all "impure" code (network, file system, global subscriber)

pub mod api;
pub mod config;
pub mod csrf;
pub mod http;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, HttpAuthGateway};
pub use csrf::{csrf_protection, CsrfConfig, CsrfProtocol};
pub use http::{ReqwestTransport, RequestExecutor};
pub use observability::{init_tracing, LogFormat, TracingEventRecorder};
pub use storage::JsonFileStorage;
