//! Wire and ceremony types for WebAuthn authentication.
//!
//! The wire types mirror the server's JSON (camelCase keys, base64url binary
//! fields); the decoded types carry raw bytes for the authenticator seam.

use serde::{Deserialize, Serialize};

/// Server-issued challenge bundle starting an authentication ceremony.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeBundle {
    #[serde(rename = "publicKey")]
    pub public_key: PublicKeyCredentialRequestOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<AllowCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<String>,
}

/// Credential descriptor inside a challenge bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowCredential {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Challenge bundle with binary fields decoded for the authenticator.
#[derive(Debug, Clone)]
pub struct DecodedChallenge {
    pub challenge: Vec<u8>,
    pub allowed_credential_ids: Vec<Vec<u8>>,
    pub rp_id: Option<String>,
    pub timeout: Option<u32>,
}

/// Signed assertion produced by an authenticator, still in binary form.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub credential_id: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// Assertion re-encoded for transmission to the finish endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyCredential {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: AuthenticatorAssertionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorAssertionResponse {
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    #[serde(
        rename = "userHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_handle: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn challenge_bundle_parses_server_json() -> Result<()> {
        let bundle: ChallengeBundle = serde_json::from_value(serde_json::json!({
            "publicKey": {
                "challenge": "AQIDBA",
                "rpId": "login.example",
                "timeout": 60_000,
                "allowCredentials": [
                    { "type": "public-key", "id": "y_uv" }
                ],
                "userVerification": "preferred"
            }
        }))?;
        assert_eq!(bundle.public_key.challenge, "AQIDBA");
        assert_eq!(bundle.public_key.rp_id.as_deref(), Some("login.example"));
        assert_eq!(bundle.public_key.allow_credentials.len(), 1);
        Ok(())
    }

    #[test]
    fn allow_credentials_default_to_empty() -> Result<()> {
        let bundle: ChallengeBundle = serde_json::from_value(serde_json::json!({
            "publicKey": { "challenge": "AQIDBA" }
        }))?;
        assert!(bundle.public_key.allow_credentials.is_empty());
        Ok(())
    }

    #[test]
    fn credential_serializes_with_exact_field_casing() -> Result<()> {
        let credential = PublicKeyCredential {
            id: "abc".to_string(),
            raw_id: "abc".to_string(),
            credential_type: "public-key".to_string(),
            response: AuthenticatorAssertionResponse {
                authenticator_data: "ZGF0YQ".to_string(),
                client_data_json: "anNvbg".to_string(),
                signature: "c2ln".to_string(),
                user_handle: Some("dXNlcg".to_string()),
            },
        };
        let value = serde_json::to_value(&credential)?;
        assert_eq!(value["rawId"], "abc");
        assert_eq!(value["type"], "public-key");
        assert_eq!(value["response"]["clientDataJSON"], "anNvbg");
        assert_eq!(value["response"]["authenticatorData"], "ZGF0YQ");
        assert_eq!(value["response"]["userHandle"], "dXNlcg");
        Ok(())
    }
}
