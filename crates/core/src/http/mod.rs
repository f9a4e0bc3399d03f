//! HTTP request model, transport port and retry policy.

pub mod ports;
pub mod request;
pub mod retry;

pub use ports::{HttpTransport, TransportError, TransportRequest, TransportResponse};
pub use request::RequestDescriptor;
pub use retry::{RetryDecision, RetryPolicy};
