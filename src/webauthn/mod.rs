//! Credential exchange client for hardware security keys and passkeys.
//!
//! ### Flow Overview
//! 1. **Preparation**: the server's challenge bundle is unwrapped and its
//!    base64url fields (challenge, allowed credential ids) are decoded into
//!    binary buffers.
//! 2. **Interaction**: an [`Authenticator`] implementation performs the
//!    platform ceremony over the decoded challenge and produces a signed
//!    assertion.
//! 3. **Finalization**: the assertion's binary fields are encoded back to
//!    base64url and submitted to the finish endpoint for verification.
//!
//! The ceremony itself is an external collaborator: this crate defines the
//! seam and the codec, not the platform integration.

pub mod encoding;
mod types;

pub use types::{
    AllowCredential, Assertion, AuthenticatorAssertionResponse, ChallengeBundle, DecodedChallenge,
    PublicKeyCredential, PublicKeyCredentialRequestOptions,
};

use thiserror::Error;

/// Why a platform ceremony did not produce an assertion.
#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("authentication was cancelled")]
    UserCancelled,
    #[error("authenticator unavailable: {0}")]
    Platform(String),
}

/// Platform authenticator seam. Implementations invoke whatever credential
/// interface the environment offers (a browser's `navigator.credentials`, a
/// CTAP device, a test double) and sign the decoded challenge.
pub trait Authenticator {
    /// # Errors
    /// Returns [`CeremonyError::UserCancelled`] when the user aborts and
    /// [`CeremonyError::Platform`] when the platform declines the ceremony.
    fn sign(&self, request: &DecodedChallenge) -> Result<Assertion, CeremonyError>;
}

/// Authenticator for environments without a security-key interface. Every
/// ceremony fails with a platform error, which the flow surfaces as a
/// step-level alert so the user can pick another method.
pub struct UnavailableAuthenticator;

impl Authenticator for UnavailableAuthenticator {
    fn sign(&self, _request: &DecodedChallenge) -> Result<Assertion, CeremonyError> {
        Err(CeremonyError::Platform(
            "no security key interface is available in this environment".to_string(),
        ))
    }
}

/// Decode a server challenge bundle for the authenticator.
///
/// # Errors
/// Returns an error if the challenge or an allowed credential id is not valid
/// base64url.
pub fn decode_challenge(
    bundle: &ChallengeBundle,
) -> Result<DecodedChallenge, encoding::DecodeError> {
    let challenge = encoding::decode(&bundle.public_key.challenge)?;
    let allowed_credential_ids = bundle
        .public_key
        .allow_credentials
        .iter()
        .map(|credential| encoding::decode(&credential.id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedChallenge {
        challenge,
        allowed_credential_ids,
        rp_id: bundle.public_key.rp_id.clone(),
        timeout: bundle.public_key.timeout,
    })
}

/// Encode a signed assertion for the finish endpoint. The credential id is
/// sent both as the `id` string and the `rawId` payload, matching what a
/// browser credential object carries.
#[must_use]
pub fn encode_assertion(assertion: &Assertion) -> PublicKeyCredential {
    let raw_id = encoding::encode(&assertion.credential_id);
    PublicKeyCredential {
        id: raw_id.clone(),
        raw_id,
        credential_type: "public-key".to_string(),
        response: AuthenticatorAssertionResponse {
            authenticator_data: encoding::encode(&assertion.authenticator_data),
            client_data_json: encoding::encode(&assertion.client_data_json),
            signature: encoding::encode(&assertion.signature),
            user_handle: assertion
                .user_handle
                .as_deref()
                .map(encoding::encode),
        },
    }
}
