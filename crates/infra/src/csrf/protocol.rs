//! Token issuance and double-submit validation

use axum::http::header::{InvalidHeaderName, InvalidHeaderValue, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use feedwire_common::{base64url_encode, random_bytes, timing_safe_eq};
use feedwire_domain::constants::CSRF_TOKEN_BYTES;
use feedwire_domain::CsrfToken;
use tracing::{debug, warn};

use super::cookie::{extract_cookie, CsrfConfig};

const DEFAULT_HEADER_NAME: &str = "x-csrf-token";

/// Issues and validates CSRF tokens for one [`CsrfConfig`].
#[derive(Debug, Clone)]
pub struct CsrfProtocol {
    config: CsrfConfig,
    header_name: HeaderName,
}

impl Default for CsrfProtocol {
    fn default() -> Self {
        Self::production()
    }
}

impl CsrfProtocol {
    /// # Errors
    ///
    /// [`InvalidHeaderName`] when `config.header_name` is not a valid
    /// HTTP header name.
    pub fn new(config: CsrfConfig) -> Result<Self, InvalidHeaderName> {
        let header_name = HeaderName::from_bytes(config.header_name.as_bytes())?;
        Ok(Self { config, header_name })
    }

    pub fn production() -> Self {
        Self {
            config: CsrfConfig::production(),
            header_name: HeaderName::from_static(DEFAULT_HEADER_NAME),
        }
    }

    pub fn development() -> Self {
        Self {
            config: CsrfConfig::development(),
            header_name: HeaderName::from_static(DEFAULT_HEADER_NAME),
        }
    }

    pub const fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// 32 bytes from the OS CSPRNG, base64url without padding (43 chars).
    #[must_use]
    pub fn generate(&self) -> CsrfToken {
        CsrfToken::new(base64url_encode(&random_bytes(CSRF_TOKEN_BYTES)))
    }

    /// Put `token` on a response: the cookie copy and the header copy.
    ///
    /// # Errors
    ///
    /// [`InvalidHeaderValue`] if the configured cookie attributes or the
    /// token contain characters not allowed in a header value.
    pub fn attach(
        &self,
        headers: &mut HeaderMap,
        token: &CsrfToken,
    ) -> Result<(), InvalidHeaderValue> {
        let cookie = HeaderValue::from_str(&self.config.build_set_cookie(token.as_str()))?;
        let header = HeaderValue::from_str(token.as_str())?;
        headers.append(SET_COOKIE, cookie);
        headers.insert(self.header_name.clone(), header);
        Ok(())
    }

    /// Double-submit check: cookie and header must both be present and
    /// equal, compared in constant time. Empty values count as missing.
    pub fn validate(&self, headers: &HeaderMap) -> bool {
        let cookie = extract_cookie(headers, &self.config.cookie_name)
            .filter(|value| !value.is_empty());
        let header = headers
            .get(&self.header_name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let (cookie, header) = match (cookie, header) {
            (Some(cookie), Some(header)) => (cookie, header),
            (cookie, header) => {
                warn!(
                    cookie_present = cookie.is_some(),
                    header_present = header.is_some(),
                    "CSRF validation failed: token missing"
                );
                return false;
            }
        };

        if cookie.len() != header.len() {
            warn!("CSRF validation failed: token length mismatch");
            return false;
        }

        let valid = timing_safe_eq(cookie.as_bytes(), header.as_bytes());
        if valid {
            debug!("CSRF token validated");
        } else {
            warn!("CSRF validation failed: token mismatch");
        }
        valid
    }
}
