//! In-progress login session state.
//!
//! One instance exists per flow mount, exclusively owned by the sequencer and
//! mutated only through its transition handlers. Secrets are held as
//! [`SecretString`] so they stay out of logs and debug output, and they are
//! wiped as soon as their step is no longer active. Nothing here is ever
//! persisted.

use crate::flow::screen::FactorKind;
use secrecy::SecretString;

#[derive(Debug, Default)]
pub struct Session {
    pub(crate) username: String,
    pub(crate) password: Option<SecretString>,
    pub(crate) totp_code: Option<SecretString>,
    pub(crate) recovery_code: Option<SecretString>,
    pub(crate) first_factor_options: Option<Vec<FactorKind>>,
    pub(crate) second_factor_options: Option<Vec<FactorKind>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Username captured by the welcome step. Empty until that step completes.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// First-factor methods offered for this username, in server order.
    #[must_use]
    pub fn first_factor_options(&self) -> Option<&[FactorKind]> {
        self.first_factor_options.as_deref()
    }

    /// Second-factor methods offered after primary success, in server order.
    /// Populated if and only if the most recent primary-factor response
    /// required a second factor.
    #[must_use]
    pub fn second_factor_options(&self) -> Option<&[FactorKind]> {
        self.second_factor_options.as_deref()
    }

    /// Wipe every transient secret input.
    pub(crate) fn clear_secrets(&mut self) {
        self.password = None;
        self.totp_code = None;
        self.recovery_code = None;
    }

    /// Reset to the state of a freshly mounted flow ("not you?").
    pub(crate) fn reset(&mut self) {
        self.username.clear();
        self.clear_secrets();
        self.first_factor_options = None;
        self.second_factor_options = None;
    }
}
