//! JWT claim decoding
//!
//! Only the payload segment is read; signatures are the server's concern.
//! Every failure mode is an error here so callers can fail closed.

use feedwire_domain::TokenClaims;
use serde_json::Value;
use thiserror::Error;

use crate::crypto::base64url_decode;

/// Reasons a token could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("token is empty")]
    Empty,

    #[error("expected 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url")]
    Encoding,

    #[error("payload is not a JSON object")]
    Payload,

    #[error("exp claim missing or not numeric")]
    MissingExpiry,
}

/// Decode the claims of a `header.payload.signature` token.
///
/// # Errors
///
/// See [`JwtError`]; no variant carries token material.
pub fn decode_claims(token: &str) -> Result<TokenClaims, JwtError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(JwtError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(JwtError::SegmentCount(segments.len()));
    }

    let bytes = base64url_decode(segments[1]).map_err(|_| JwtError::Encoding)?;
    let payload: Value = serde_json::from_slice(&bytes).map_err(|_| JwtError::Payload)?;
    let object = payload.as_object().ok_or(JwtError::Payload)?;

    let exp = object
        .get("exp")
        .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs.floor() as i64)))
        .ok_or(JwtError::MissingExpiry)?;
    let sub = object.get("sub").and_then(Value::as_str).map(str::to_owned);

    Ok(TokenClaims { exp, sub })
}

/// Fail-closed expiry check: undecodable tokens count as expired.
#[must_use]
pub fn is_expired(token: &str, now_secs: i64) -> bool {
    decode_claims(token).map_or(true, |claims| claims.is_expired_at(now_secs))
}

/// Fail-closed: undecodable tokens count as expiring.
#[must_use]
pub fn is_expiring_soon(token: &str, now_secs: i64, grace_secs: i64) -> bool {
    decode_claims(token).map_or(true, |claims| claims.expires_within(now_secs, grace_secs))
}

/// Build an unsigned token around `payload`. Test helper.
#[doc(hidden)]
#[must_use]
pub fn encode_unsigned(payload: &Value) -> String {
    use crate::crypto::base64url_encode;

    let header = base64url_encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = base64url_encode(payload.to_string().as_bytes());
    format!("{header}.{body}.signature")
}
