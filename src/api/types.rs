//! Request/response types for the login endpoints.

use crate::flow::FactorKind;
use serde::{Deserialize, Serialize};

/// Successful verification response shared by every login endpoint.
///
/// `two_factor_required` tells the flow whether verification is complete;
/// `second_factors` lists the qualifying methods in server order, and
/// `recent_factor` is the method most recently used successfully by this
/// user, offered as a skip hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    #[serde(default)]
    pub two_factor_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_factors: Option<Vec<FactorKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_factor: Option<FactorKind>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsResponse {
    pub options: Vec<FactorKind>,
}

#[derive(Debug, Serialize)]
pub struct PasswordLoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body for the one-time-code and recovery-code endpoints.
#[derive(Debug, Serialize)]
pub struct CodeRequest<'a> {
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PasswordlessStartRequest<'a> {
    pub username: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PgpChallengeResponse {
    pub challenge: String,
}

#[derive(Debug, Serialize)]
pub struct PgpChallengeRequest<'a> {
    pub username: &'a str,
    pub signature: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn outcome_without_second_factor_parses() -> Result<()> {
        let outcome: LoginOutcome =
            serde_json::from_str(r#"{"two_factor_required":false}"#)?;
        assert!(!outcome.two_factor_required);
        assert!(outcome.second_factors.is_none());
        assert!(outcome.recent_factor.is_none());
        Ok(())
    }

    #[test]
    fn outcome_with_second_factors_parses() -> Result<()> {
        let outcome: LoginOutcome = serde_json::from_str(
            r#"{
                "two_factor_required": true,
                "second_factors": ["totp", "webauthn"],
                "recent_factor": "webauthn"
            }"#,
        )?;
        assert!(outcome.two_factor_required);
        assert_eq!(
            outcome.second_factors,
            Some(vec![FactorKind::Totp, FactorKind::Webauthn])
        );
        assert_eq!(outcome.recent_factor, Some(FactorKind::Webauthn));
        Ok(())
    }

    #[test]
    fn empty_outcome_defaults_to_no_second_factor() -> Result<()> {
        let outcome: LoginOutcome = serde_json::from_str("{}")?;
        assert!(!outcome.two_factor_required);
        Ok(())
    }
}
