//! HTTP transport and single-attempt execution

pub mod executor;
pub mod transport;

pub use executor::{classify_status, classify_transport, AttemptOutcome, RequestExecutor};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder};
