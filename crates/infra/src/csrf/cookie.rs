//! CSRF cookie configuration and cookie header helpers

use axum::http::{header, HeaderMap};
use feedwire_domain::constants::{
    CSRF_COOKIE_MAX_AGE_SECS, CSRF_COOKIE_NAME, CSRF_COOKIE_PATH, CSRF_HEADER,
};
use feedwire_domain::{CsrfSettings, SameSite};

/// Where and how the token pair is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    pub cookie_name: String,
    pub header_name: String,
    pub max_age_secs: u64,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl CsrfConfig {
    /// `Secure` cookie, `SameSite=Strict`, 24h lifetime.
    pub fn production() -> Self {
        Self {
            cookie_name: CSRF_COOKIE_NAME.to_string(),
            header_name: CSRF_HEADER.to_string(),
            max_age_secs: CSRF_COOKIE_MAX_AGE_SECS,
            secure: true,
            same_site: SameSite::Strict,
            path: CSRF_COOKIE_PATH.to_string(),
        }
    }

    /// Same as production minus `Secure`, for plain-HTTP localhost.
    pub fn development() -> Self {
        Self { secure: false, ..Self::production() }
    }

    pub fn from_settings(settings: &CsrfSettings) -> Self {
        Self {
            cookie_name: settings.cookie_name.clone(),
            header_name: settings.header_name.clone(),
            max_age_secs: settings.max_age_secs,
            secure: settings.secure,
            ..Self::production()
        }
    }

    /// Build the `Set-Cookie` header value for `value`.
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.cookie_name, value);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!(
            "; SameSite={}; Path={}; Max-Age={}",
            self.same_site, self.path, self.max_age_secs
        ));
        cookie
    }
}

/// Extract a cookie value from the `Cookie` request header(s).
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}
