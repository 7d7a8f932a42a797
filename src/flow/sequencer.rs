//! Screen sequencer: the state machine at the heart of the login flow.
//!
//! The sequencer owns the single authoritative [`Screen`] value and the
//! [`Session`] it describes, and applies transition rules in response to
//! events. Transitions are total: an event that does not apply to the active
//! screen leaves the flow untouched instead of panicking, which also
//! neutralizes stale or out-of-order results.
//!
//! Transition methods are pure with respect to I/O. The step handlers perform
//! the network calls and feed results in, so every rule here is testable with
//! canned results.

use crate::api::types::LoginOutcome;
use crate::flow::screen::{FactorKind, Screen};
use crate::flow::session::Session;
use tracing::debug;

/// Outcome of applying one event to the sequencer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Advance {
    /// Nothing changed; the active screen keeps its state (and possibly a
    /// fresh field error or alert).
    Stay,
    /// The flow moved to another screen.
    Next(Screen),
    /// No further factor is required; the caller should leave the flow via
    /// the success resolver.
    Authenticated,
}

/// Input field an inline error message is attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Username,
    Password,
    Totp,
    RecoveryCode,
    PgpSignature,
}

/// Inline error shown on the active step's input field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    screen: Screen,
    session: Session,
    field_error: Option<FieldError>,
    alert: Option<String>,
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Inline error attached to the active step's input field, if any.
    #[must_use]
    pub fn field_error(&self) -> Option<&FieldError> {
        self.field_error.as_ref()
    }

    /// Step-level alert (ceremony failures), if any.
    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// The welcome step captured a username. No-op outside the welcome step;
    /// the username is immutable for the rest of the flow.
    pub fn username_submitted(&mut self, username: &str) {
        if self.screen != Screen::Welcome {
            return;
        }
        self.clear_messages();
        self.session.username = username.trim().to_string();
    }

    /// The primary-option fetch for the captured username completed.
    ///
    /// A single offered option is entered directly; the picker is only shown
    /// when there is a real choice to make. An empty list is treated as a
    /// failure of the welcome step.
    pub fn first_factor_options_loaded(&mut self, options: Vec<FactorKind>) -> Advance {
        if self.screen != Screen::Welcome {
            return Advance::Stay;
        }
        if options.is_empty() {
            self.fail(
                Field::Username,
                "No sign-in methods are available for this account.",
            );
            return Advance::Stay;
        }
        self.clear_messages();
        let target = if options.len() == 1 {
            options[0].first_factor_screen()
        } else {
            Screen::LoginOptions
        };
        self.session.first_factor_options = Some(options);
        self.transition(target)
    }

    /// The user picked a primary method from the picker.
    pub fn first_factor_chosen(&mut self, kind: FactorKind) -> Advance {
        if self.screen != Screen::LoginOptions || !self.offers_first_factor(kind) {
            return Advance::Stay;
        }
        self.clear_messages();
        debug!(factor = kind.as_str(), "first factor chosen");
        self.transition(kind.first_factor_screen())
    }

    /// A verification request on the active factor screen succeeded.
    ///
    /// Primary and second factors funnel through the same rule: the server
    /// reports whether another factor is still required and which methods
    /// qualify. When it is, the single-option shortcut is checked before the
    /// recent-factor hint, and the hint only applies when the remembered
    /// factor is still among the offered ones; otherwise the picker is shown.
    pub fn authentication_succeeded(&mut self, outcome: &LoginOutcome) -> Advance {
        if !self.on_factor_screen() {
            return Advance::Stay;
        }
        self.clear_messages();
        self.session.clear_secrets();

        let offered = outcome.second_factors.as_deref().unwrap_or_default();
        if !outcome.two_factor_required || offered.is_empty() {
            self.session.second_factor_options = None;
            debug!(screen = self.screen.as_str(), "authentication satisfied");
            return Advance::Authenticated;
        }

        let target = if offered.len() == 1 {
            offered[0].second_factor_screen()
        } else if let Some(recent) = outcome.recent_factor.filter(|r| offered.contains(r)) {
            recent.second_factor_screen()
        } else {
            Screen::TwoFactorOptions
        };
        self.session.second_factor_options = Some(offered.to_vec());
        self.transition(target)
    }

    /// The user picked a second-factor method from the picker.
    pub fn second_factor_chosen(&mut self, kind: FactorKind) -> Advance {
        if self.screen != Screen::TwoFactorOptions || !self.offers_second_factor(kind) {
            return Advance::Stay;
        }
        self.clear_messages();
        debug!(factor = kind.as_str(), "second factor chosen");
        self.transition(kind.second_factor_screen())
    }

    /// "More options" on a second-factor screen returns to the picker.
    pub fn more_second_factor_options(&mut self) -> Advance {
        let has_options = self
            .session
            .second_factor_options
            .as_ref()
            .is_some_and(|o| !o.is_empty());
        if !self.on_second_factor_screen() || !has_options {
            return Advance::Stay;
        }
        self.clear_messages();
        self.transition(Screen::TwoFactorOptions)
    }

    /// Back out of a non-password primary screen to the primary choice:
    /// the picker when more than one method was offered, the welcome step
    /// otherwise.
    pub fn back_to_first_factor_choice(&mut self) -> Advance {
        if !self.on_primary_factor_screen() || self.screen == Screen::Password {
            return Advance::Stay;
        }
        self.clear_messages();
        let target = if self
            .session
            .first_factor_options
            .as_ref()
            .is_some_and(|o| o.len() > 1)
        {
            Screen::LoginOptions
        } else {
            Screen::Welcome
        };
        self.transition(target)
    }

    /// "Not you?" on the password screen: clear the captured identity and
    /// start over from the welcome step.
    pub fn switch_account(&mut self) -> Advance {
        if self.screen != Screen::Password {
            return Advance::Stay;
        }
        self.clear_messages();
        self.session.reset();
        self.transition(Screen::Welcome)
    }

    /// A verification request failed: stay put and surface the message on
    /// the step's input field.
    pub fn step_failed(&mut self, field: Field, message: impl Into<String>) {
        self.fail(field, message);
    }

    /// A ceremony failed: stay put and surface a step-level alert.
    pub fn step_alert(&mut self, message: impl Into<String>) {
        self.field_error = None;
        self.alert = Some(message.into());
    }

    fn fail(&mut self, field: Field, message: impl Into<String>) {
        self.alert = None;
        self.field_error = Some(FieldError {
            field,
            message: message.into(),
        });
    }

    fn clear_messages(&mut self) {
        self.field_error = None;
        self.alert = None;
    }

    fn transition(&mut self, to: Screen) -> Advance {
        if to != self.screen {
            debug!(from = self.screen.as_str(), to = to.as_str(), "screen transition");
            self.screen = to;
        }
        Advance::Next(to)
    }

    fn offers_first_factor(&self, kind: FactorKind) -> bool {
        self.session
            .first_factor_options
            .as_ref()
            .is_some_and(|o| o.contains(&kind))
    }

    fn offers_second_factor(&self, kind: FactorKind) -> bool {
        self.session
            .second_factor_options
            .as_ref()
            .is_some_and(|o| o.contains(&kind))
    }

    /// The PGP screen serves both roles; its role follows from whether a
    /// primary factor already succeeded and reported second-factor options.
    fn on_primary_factor_screen(&self) -> bool {
        match self.screen {
            Screen::Password | Screen::WebauthnPasswordless => true,
            Screen::Pgp => self.session.second_factor_options.is_none(),
            _ => false,
        }
    }

    fn on_second_factor_screen(&self) -> bool {
        match self.screen {
            Screen::Totp | Screen::RecoveryCode | Screen::Webauthn => true,
            Screen::Pgp => self.session.second_factor_options.is_some(),
            _ => false,
        }
    }

    fn on_factor_screen(&self) -> bool {
        self.on_primary_factor_screen() || self.on_second_factor_screen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(
        two_factor_required: bool,
        second_factors: Option<Vec<FactorKind>>,
        recent_factor: Option<FactorKind>,
    ) -> LoginOutcome {
        LoginOutcome {
            two_factor_required,
            second_factors,
            recent_factor,
        }
    }

    fn sequencer_on_password() -> Sequencer {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        sequencer.first_factor_options_loaded(vec![FactorKind::Password]);
        assert_eq!(sequencer.screen(), Screen::Password);
        sequencer
    }

    #[test]
    fn starts_on_welcome() {
        assert_eq!(Sequencer::new().screen(), Screen::Welcome);
    }

    #[test]
    fn single_first_factor_skips_the_picker() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        let advance = sequencer.first_factor_options_loaded(vec![FactorKind::Password]);
        assert_eq!(advance, Advance::Next(Screen::Password));
        assert_eq!(sequencer.session().username(), "alice");
    }

    #[test]
    fn multiple_first_factors_show_the_picker() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        let advance = sequencer
            .first_factor_options_loaded(vec![FactorKind::Password, FactorKind::Webauthn]);
        assert_eq!(advance, Advance::Next(Screen::LoginOptions));
    }

    #[test]
    fn empty_first_factor_options_fail_the_welcome_step() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        let advance = sequencer.first_factor_options_loaded(vec![]);
        assert_eq!(advance, Advance::Stay);
        assert_eq!(sequencer.screen(), Screen::Welcome);
        assert_eq!(
            sequencer.field_error().map(|e| e.field),
            Some(Field::Username)
        );
    }

    #[test]
    fn picking_an_unoffered_first_factor_is_a_no_op() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        sequencer.first_factor_options_loaded(vec![FactorKind::Password, FactorKind::Pgp]);
        let advance = sequencer.first_factor_chosen(FactorKind::Webauthn);
        assert_eq!(advance, Advance::Stay);
        assert_eq!(sequencer.screen(), Screen::LoginOptions);
    }

    #[test]
    fn password_success_without_second_factor_authenticates() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(false, None, None));
        assert_eq!(advance, Advance::Authenticated);
        assert!(sequencer.session().second_factor_options().is_none());
    }

    #[test]
    fn required_flag_without_factors_still_authenticates() {
        // Defensive reading of an inconsistent response: nothing to verify
        // against means nothing more to ask the user for.
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(true, Some(vec![]), None));
        assert_eq!(advance, Advance::Authenticated);
    }

    #[test]
    fn single_second_factor_skips_the_picker() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp]),
            None,
        ));
        assert_eq!(advance, Advance::Next(Screen::Totp));
    }

    #[test]
    fn single_second_factor_beats_recent_factor_hint() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp]),
            Some(FactorKind::Totp),
        ));
        assert_eq!(advance, Advance::Next(Screen::Totp));
    }

    #[test]
    fn recent_factor_skips_the_picker_when_offered() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::Webauthn]),
            Some(FactorKind::Webauthn),
        ));
        assert_eq!(advance, Advance::Next(Screen::Webauthn));
        assert_eq!(
            sequencer.session().second_factor_options(),
            Some([FactorKind::Totp, FactorKind::Webauthn].as_slice())
        );
    }

    #[test]
    fn unoffered_recent_factor_falls_back_to_the_picker() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::RecoveryCode]),
            Some(FactorKind::Webauthn),
        ));
        assert_eq!(advance, Advance::Next(Screen::TwoFactorOptions));
    }

    #[test]
    fn several_second_factors_without_hint_show_the_picker() {
        let mut sequencer = sequencer_on_password();
        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::Webauthn]),
            None,
        ));
        assert_eq!(advance, Advance::Next(Screen::TwoFactorOptions));
    }

    #[test]
    fn second_factor_success_authenticates() {
        let mut sequencer = sequencer_on_password();
        sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::Webauthn]),
            None,
        ));
        sequencer.second_factor_chosen(FactorKind::Totp);
        assert_eq!(sequencer.screen(), Screen::Totp);

        let advance = sequencer.authentication_succeeded(&outcome(false, None, None));
        assert_eq!(advance, Advance::Authenticated);
    }

    #[test]
    fn more_options_returns_to_the_second_factor_picker() {
        let mut sequencer = sequencer_on_password();
        sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::Webauthn]),
            Some(FactorKind::Webauthn),
        ));
        assert_eq!(sequencer.screen(), Screen::Webauthn);

        let advance = sequencer.more_second_factor_options();
        assert_eq!(advance, Advance::Next(Screen::TwoFactorOptions));
    }

    #[test]
    fn more_options_is_a_no_op_outside_second_factor_screens() {
        let mut sequencer = sequencer_on_password();
        assert_eq!(sequencer.more_second_factor_options(), Advance::Stay);
        assert_eq!(sequencer.screen(), Screen::Password);
    }

    #[test]
    fn switch_account_clears_identity_and_returns_to_welcome() {
        let mut sequencer = sequencer_on_password();
        sequencer.session_mut().password = Some(secrecy::SecretString::from("hunter2"));

        let advance = sequencer.switch_account();
        assert_eq!(advance, Advance::Next(Screen::Welcome));
        assert!(sequencer.session().username().is_empty());
        assert!(sequencer.session().first_factor_options().is_none());
    }

    #[test]
    fn failure_keeps_the_screen_and_records_the_message() {
        let mut sequencer = sequencer_on_password();
        sequencer.step_failed(Field::Password, "Login failed.");
        assert_eq!(sequencer.screen(), Screen::Password);
        let error = sequencer.field_error().expect("field error");
        assert_eq!(error.field, Field::Password);
        assert_eq!(error.message, "Login failed.");
    }

    #[test]
    fn success_result_on_a_picker_screen_is_a_no_op() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("alice");
        sequencer.first_factor_options_loaded(vec![FactorKind::Password, FactorKind::Pgp]);

        let advance = sequencer.authentication_succeeded(&outcome(false, None, None));
        assert_eq!(advance, Advance::Stay);
        assert_eq!(sequencer.screen(), Screen::LoginOptions);
    }

    #[test]
    fn pgp_acts_as_primary_before_any_second_factor_is_required() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("carol");
        sequencer.first_factor_options_loaded(vec![FactorKind::Pgp]);
        assert_eq!(sequencer.screen(), Screen::Pgp);

        let advance = sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Totp, FactorKind::RecoveryCode]),
            None,
        ));
        assert_eq!(advance, Advance::Next(Screen::TwoFactorOptions));
    }

    #[test]
    fn pgp_acts_as_second_factor_after_primary_success() {
        let mut sequencer = sequencer_on_password();
        sequencer.authentication_succeeded(&outcome(
            true,
            Some(vec![FactorKind::Pgp, FactorKind::Totp]),
            None,
        ));
        sequencer.second_factor_chosen(FactorKind::Pgp);
        assert_eq!(sequencer.screen(), Screen::Pgp);

        let advance = sequencer.more_second_factor_options();
        assert_eq!(advance, Advance::Next(Screen::TwoFactorOptions));
    }

    #[test]
    fn back_from_passwordless_returns_to_the_choice() {
        let mut sequencer = Sequencer::new();
        sequencer.username_submitted("dave");
        sequencer.first_factor_options_loaded(vec![
            FactorKind::Password,
            FactorKind::Webauthn,
        ]);
        sequencer.first_factor_chosen(FactorKind::Webauthn);
        assert_eq!(sequencer.screen(), Screen::WebauthnPasswordless);

        let advance = sequencer.back_to_first_factor_choice();
        assert_eq!(advance, Advance::Next(Screen::LoginOptions));
    }
}
