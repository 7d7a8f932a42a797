//! Typed HTTP client for the login endpoints.
//!
//! One method per step, each issuing exactly one request. Responses are
//! translated at this boundary into [`LoginOutcome`] values or [`ApiError`]s;
//! nothing above this layer touches status codes or raw JSON. The client
//! keeps a cookie store because the server tracks the half-authenticated
//! state between the primary and second factor in its session cookie.

pub mod types;

use crate::flow::FactorKind;
use crate::webauthn::{ChallengeBundle, PublicKeyCredential};
use crate::APP_USER_AGENT;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use types::{
    CodeRequest, LoginOutcome, OptionsResponse, PasswordLoginRequest, PasswordlessStartRequest,
    PgpChallengeRequest, PgpChallengeResponse,
};
use url::Url;

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fallback message when a rejection carries no error body.
const GENERIC_FAILURE: &str = "Login failed.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request failed ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message suitable for the active step's input field.
    #[must_use]
    pub fn field_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport(_) => {
                "Network error. Check your connection and try again.".to_string()
            }
            Self::Config(_) | Self::Parse(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

fn rejection_message(json_response: &Value) -> Option<&str> {
    json_response.get("error").and_then(Value::as_str)
}

pub struct ApiClient {
    http: Client,
    origin: String,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` cannot be parsed, has no host, or uses
    /// an unsupported scheme.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let url = Url::parse(base_url).map_err(|err| ApiError::Config(err.to_string()))?;

        let scheme = url.scheme();
        let host = url
            .host()
            .ok_or_else(|| ApiError::Config("no host specified".to_string()))?
            .to_owned();
        let port = match url.port() {
            Some(p) => p,
            None => match scheme {
                "http" => 80,
                "https" => 443,
                _ => {
                    return Err(ApiError::Config(format!("unsupported scheme {scheme}")));
                }
            },
        };

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            origin: format!("{scheme}://{host}:{port}"),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let endpoint_url = format!("{}{path}", self.origin);
        debug!("endpoint URL: {}", endpoint_url);
        endpoint_url
    }

    /// Fetch the primary methods available for a username.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects it.
    pub async fn login_options(&self, username: &str) -> Result<Vec<FactorKind>, ApiError> {
        let url = self.endpoint("/api/login/options");
        let span = info_span!("login.options", http.method = "GET", url = %url);
        let response = self
            .http
            .get(&url)
            .query(&[("username", username)])
            .send()
            .instrument(span)
            .await?;
        let body: OptionsResponse = Self::success_json(response).await?;
        Ok(body.options)
    }

    /// Verify a password.
    ///
    /// # Errors
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn login_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/password");
        let span = info_span!("login.password", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&PasswordLoginRequest {
                username,
                password: password.expose_secret(),
            })
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Verify a one-time code as the second factor.
    ///
    /// # Errors
    /// Returns an error if the request fails or the code is rejected.
    pub async fn login_totp(&self, code: &SecretString) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/totp");
        let span = info_span!("login.totp", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&CodeRequest {
                code: code.expose_secret(),
            })
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Verify a recovery code as the second factor.
    ///
    /// # Errors
    /// Returns an error if the request fails or the code is rejected.
    pub async fn login_recovery_code(
        &self,
        code: &SecretString,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/recovery-codes");
        let span = info_span!("login.recovery_code", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&CodeRequest {
                code: code.expose_secret(),
            })
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Request a security-key challenge for the second factor.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects it.
    pub async fn webauthn_start(&self) -> Result<ChallengeBundle, ApiError> {
        let url = self.endpoint("/api/login/webauthn/start");
        let span = info_span!("login.webauthn.start", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Submit a signed security-key assertion for the second factor.
    ///
    /// # Errors
    /// Returns an error if the request fails or the assertion is rejected.
    pub async fn webauthn_finish(
        &self,
        credential: &PublicKeyCredential,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/webauthn/finish");
        let span = info_span!("login.webauthn.finish", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(credential)
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Request a passkey challenge for passwordless primary authentication.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects it.
    pub async fn webauthn_passwordless_start(
        &self,
        username: &str,
    ) -> Result<ChallengeBundle, ApiError> {
        let url = self.endpoint("/api/login/webauthn/passwordless/start");
        let span =
            info_span!("login.webauthn.passwordless.start", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&PasswordlessStartRequest { username })
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Submit a signed passkey assertion for passwordless primary
    /// authentication.
    ///
    /// # Errors
    /// Returns an error if the request fails or the assertion is rejected.
    pub async fn webauthn_passwordless_finish(
        &self,
        credential: &PublicKeyCredential,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/webauthn/passwordless/finish");
        let span =
            info_span!("login.webauthn.passwordless.finish", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(credential)
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    /// Fetch the text challenge for PGP authentication.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects it.
    pub async fn pgp_challenge(&self) -> Result<String, ApiError> {
        let url = self.endpoint("/api/login/pgp/challenge");
        let span = info_span!("login.pgp.challenge", http.method = "GET", url = %url);
        let response = self.http.get(&url).send().instrument(span).await?;
        let body: PgpChallengeResponse = Self::success_json(response).await?;
        Ok(body.challenge)
    }

    /// Submit the signature over the PGP challenge.
    ///
    /// # Errors
    /// Returns an error if the request fails or the signature is rejected.
    pub async fn login_pgp(
        &self,
        username: &str,
        signature: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/api/login/pgp/challenge");
        let span = info_span!("login.pgp.verify", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&PgpChallengeRequest {
                username,
                signature,
            })
            .send()
            .instrument(span)
            .await?;
        Self::success_json(response).await
    }

    async fn success_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .as_ref()
                .and_then(rejection_message)
                .map_or_else(|| GENERIC_FAILURE.to_string(), str::to_string);

            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_normalizes_the_port() -> anyhow::Result<()> {
        let client = ApiClient::new("https://login.example")?;
        assert_eq!(
            client.endpoint("/api/login/options"),
            "https://login.example:443/api/login/options"
        );

        let client = ApiClient::new("http://localhost:8080")?;
        assert_eq!(
            client.endpoint("/api/login/totp"),
            "http://localhost:8080/api/login/totp"
        );
        Ok(())
    }

    #[test]
    fn base_url_must_have_a_supported_scheme_and_host() {
        assert!(matches!(
            ApiClient::new("ftp://login.example"),
            Err(ApiError::Config(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn rejection_message_reads_the_error_field() {
        let body = serde_json::json!({ "error": "Login failed." });
        assert_eq!(rejection_message(&body), Some("Login failed."));
        assert_eq!(rejection_message(&serde_json::json!({})), None);
    }

    #[test]
    fn field_message_prefers_the_server_rejection() {
        let rejected = ApiError::Rejected {
            status: 401,
            message: "Invalid username or password".to_string(),
        };
        assert_eq!(rejected.field_message(), "Invalid username or password");

        let parse = ApiError::Parse("truncated body".to_string());
        assert_eq!(parse.field_message(), GENERIC_FAILURE);
    }
}
