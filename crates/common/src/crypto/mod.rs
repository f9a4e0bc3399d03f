//! Cryptographic primitives for token issuance and comparison.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate cryptographically secure random bytes from the OS CSPRNG.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Encode bytes as base64url without padding (`-` and `_`, no `=`).
///
/// 32 input bytes always encode to 43 characters.
#[must_use]
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url. Trailing `=` padding is tolerated.
///
/// # Errors
///
/// Returns [`base64::DecodeError`] for characters outside the URL-safe
/// alphabet or an impossible length.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input.trim_end_matches('='))
}

/// Constant-time comparison.
///
/// Different lengths return `false` immediately; length is not secret.
/// Equal lengths are compared over the full buffer with an OR of XORs so
/// the running time does not depend on where the inputs first differ.
#[must_use]
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
