//! # Feedwire Core
//!
//! Request-resilience and cache-consistency logic, free of I/O.
//!
//! This crate contains:
//! - Token and CSRF state over injected key-value storage
//! - The retry policy and single-flight token refresh
//! - The query cache and optimistic mutation protocol
//! - Port interfaces (traits) for transport, auth endpoints, navigation,
//!   telemetry and list validation
//!
//! ## Architecture Principles
//! - Depends only on `feedwire-common` and `feedwire-domain`
//! - No HTTP client, file system or platform code
//! - All external effects go through traits

pub mod auth;
pub mod cache;
pub mod csrf;
pub mod http;

// Collaborator ports
pub mod navigation_ports;
pub mod telemetry_ports;
pub mod validation_ports;

pub use auth::{AuthGateway, RefreshCoordinator, TokenStore};
pub use cache::{
    CacheEvent, CacheKey, CacheSnapshot, FetchOutcome, Identified, OptimisticMutationCoordinator,
    QueryCache,
};
pub use csrf::{is_csrf_failure, CsrfRecovery, CsrfTokenStore, RecoveryOutcome};
pub use http::{
    HttpTransport, RequestDescriptor, RetryDecision, RetryPolicy, TransportError,
    TransportRequest, TransportResponse,
};
pub use navigation_ports::{Navigator, NoopNavigator};
pub use telemetry_ports::{EventRecorder, NoopEventRecorder};
pub use validation_ports::{AcceptAllValidator, ListResponseValidator};
