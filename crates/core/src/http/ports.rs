//! Transport port: one raw HTTP exchange, no classification.

use async_trait::async_trait;
use feedwire_domain::HttpMethod;
use thiserror::Error;

/// Fully prepared request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<String>,
}

impl TransportRequest {
    /// First header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Raw response: status, headers and the undecoded body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, reset, DNS failure, TLS failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport rejected the request before sending it.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Sends one prepared request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// # Errors
    ///
    /// [`TransportError`] when no response was received. Any HTTP status,
    /// including 4xx and 5xx, is a successful exchange.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
}
