//! reqwest-backed [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use feedwire_core::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use feedwire_domain::{FeedwireError, HttpMethod};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

/// Sends prepared requests with a shared [`reqwest::Client`].
///
/// Timeouts are enforced by the executor, not here, so one client serves
/// requests with different per-call timeouts.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] if the TLS backend fails to
    /// initialise.
    pub fn new() -> Result<Self, FeedwireError> {
        Self::builder().build()
    }

    /// Wrap an existing client.
    pub const fn from_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = to_reqwest_method(request.method);
        let mut builder = self.client.request(method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!(%method, url = %request.url, "sending HTTP request");
        let response = builder.send().await.map_err(|err| map_reqwest_error(&err))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|err| map_reqwest_error(&err))?;

        debug!(%method, url = %request.url, status, "received HTTP response");
        Ok(TransportResponse { status, headers, body })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`FeedwireError::Config`] when reqwest rejects the settings.
    pub fn build(self) -> Result<ReqwestTransport, FeedwireError> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder
            .build()
            .map_err(|err| FeedwireError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(ReqwestTransport { client })
    }
}
