//! Screen and factor tags for the login flow.
//!
//! `Screen` is the closed set of steps the flow can display. It is owned by
//! the sequencer and never inferred from server schema types; `FactorKind` is
//! the boundary type the API layer deserializes, and the mapping functions
//! here translate offered factors into screens.

use serde::{Deserialize, Serialize};

/// The active step of the login flow. Exactly one is active at a time.
///
/// There is no terminal variant: a fully satisfied login leaves the flow via
/// a resolved redirect path instead of landing on a screen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Screen {
    #[default]
    Welcome,
    LoginOptions,
    Password,
    TwoFactorOptions,
    Totp,
    RecoveryCode,
    Webauthn,
    WebauthnPasswordless,
    Pgp,
}

impl Screen {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::LoginOptions => "login-options",
            Self::Password => "password",
            Self::TwoFactorOptions => "two-factor-options",
            Self::Totp => "totp",
            Self::RecoveryCode => "recoverycode",
            Self::Webauthn => "webauthn",
            Self::WebauthnPasswordless => "webauthn-passwordless",
            Self::Pgp => "pgp",
        }
    }
}

/// An authentication method the server may offer.
///
/// The same tag type is used for first- and second-factor offers, but the two
/// option sets are independent: WebAuthn maps to the passwordless screen when
/// offered as a first factor and to the security-key screen when offered as a
/// second factor. PGP participates in both pickers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorKind {
    Password,
    Webauthn,
    #[serde(rename = "webauthn-passwordless")]
    WebauthnPasswordless,
    Totp,
    RecoveryCode,
    Pgp,
}

impl FactorKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Webauthn => "webauthn",
            Self::WebauthnPasswordless => "webauthn-passwordless",
            Self::Totp => "totp",
            Self::RecoveryCode => "recoverycode",
            Self::Pgp => "pgp",
        }
    }

    /// Human-readable label for pickers.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Password => "Password",
            Self::Webauthn | Self::WebauthnPasswordless => "Security key / Passkey",
            Self::Totp => "One-time Code",
            Self::RecoveryCode => "Recovery Code",
            Self::Pgp => "PGP Key",
        }
    }

    /// Screen entered when this factor is picked as the primary method.
    #[must_use]
    pub fn first_factor_screen(self) -> Screen {
        match self {
            Self::Password => Screen::Password,
            Self::Webauthn | Self::WebauthnPasswordless => Screen::WebauthnPasswordless,
            Self::Pgp => Screen::Pgp,
            // The server does not offer these as primary methods; sending the
            // user to the second-factor variant keeps the mapping total.
            Self::Totp => Screen::Totp,
            Self::RecoveryCode => Screen::RecoveryCode,
        }
    }

    /// Screen entered when this factor is picked as the second factor.
    #[must_use]
    pub fn second_factor_screen(self) -> Screen {
        match self {
            Self::Totp => Screen::Totp,
            Self::RecoveryCode => Screen::RecoveryCode,
            Self::Webauthn | Self::WebauthnPasswordless => Screen::Webauthn,
            Self::Pgp => Screen::Pgp,
            Self::Password => Screen::Password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn factor_kind_wire_names() -> Result<()> {
        let encoded = serde_json::to_string(&vec![
            FactorKind::Password,
            FactorKind::Webauthn,
            FactorKind::WebauthnPasswordless,
            FactorKind::Totp,
            FactorKind::RecoveryCode,
            FactorKind::Pgp,
        ])?;
        assert_eq!(
            encoded,
            r#"["password","webauthn","webauthn-passwordless","totp","recoverycode","pgp"]"#
        );
        Ok(())
    }

    #[test]
    fn factor_kind_round_trips() -> Result<()> {
        let decoded: Vec<FactorKind> =
            serde_json::from_str(r#"["totp","recoverycode","webauthn"]"#)?;
        assert_eq!(
            decoded,
            vec![
                FactorKind::Totp,
                FactorKind::RecoveryCode,
                FactorKind::Webauthn
            ]
        );
        Ok(())
    }

    #[test]
    fn webauthn_screen_depends_on_role() {
        assert_eq!(
            FactorKind::Webauthn.first_factor_screen(),
            Screen::WebauthnPasswordless
        );
        assert_eq!(FactorKind::Webauthn.second_factor_screen(), Screen::Webauthn);
    }

    #[test]
    fn pgp_is_offered_in_both_pickers() {
        assert_eq!(FactorKind::Pgp.first_factor_screen(), Screen::Pgp);
        assert_eq!(FactorKind::Pgp.second_factor_screen(), Screen::Pgp);
    }
}
