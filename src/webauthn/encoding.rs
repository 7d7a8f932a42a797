//! Binary/text codec for WebAuthn wire fields.
//!
//! Challenges, credential ids, and assertion payloads are raw bytes inside
//! the authenticator ceremony but travel as base64url-without-padding text.
//! Whatever is decoded on the way in must be re-encoded byte-for-byte on the
//! way out, or the server-side signature verification fails.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid base64url payload: {0}")]
pub struct DecodeError(String);

#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// # Errors
/// Returns an error if `value` is not base64url without padding.
pub fn decode(value: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(value.as_bytes())
        .map_err(|err| DecodeError(err.to_string()))
}
