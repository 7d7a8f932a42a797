//! Step handlers: the bridge between the sequencer and the API client.
//!
//! `LoginFlow` owns the sequencer, the HTTP client, and the `next` redirect
//! parameter for one flow mount. Each handler issues exactly one verification
//! request and interprets its result through the sequencer's transition
//! rules; errors are folded into field messages or step alerts and never
//! bubble out, so the caller only ever observes a [`Progress`] value.
//!
//! At most one request is in flight at a time. The guard exists for the
//! one-time-code step, where the automatic trigger and a manual submission
//! can race: the second trigger observes the in-flight state and is dropped.
//! Dropping the flow (or an in-flight future) discards all pending request
//! state, and the sequencer ignores results that no longer match the active
//! screen.

use crate::api::types::LoginOutcome;
use crate::api::{ApiClient, ApiError};
use crate::flow::otp::{self, OtpEntry};
use crate::flow::screen::{FactorKind, Screen};
use crate::flow::sequencer::{Advance, Field, FieldError, Sequencer};
use crate::flow::session::Session;
use crate::flow::success;
use crate::webauthn::{self, Authenticator};
use secrecy::SecretString;
use tracing::{info, warn};
use uuid::Uuid;

/// What the caller should do after an event was handled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Progress {
    /// Keep displaying the active screen; a field error or alert may have
    /// been recorded.
    Stay,
    /// Display the given screen.
    Screen(Screen),
    /// Authentication is complete: leave the flow for this destination.
    Redirect(String),
}

pub struct LoginFlow {
    client: ApiClient,
    sequencer: Sequencer,
    next: Option<String>,
    flow_id: Uuid,
    in_flight: bool,
    otp: OtpEntry,
}

impl LoginFlow {
    /// Mount a fresh flow. `next` is the optional post-login destination,
    /// validated on redirect.
    #[must_use]
    pub fn new(client: ApiClient, next: Option<String>) -> Self {
        let flow_id = Uuid::new_v4();
        info!(%flow_id, "login flow mounted");
        Self {
            client,
            sequencer: Sequencer::new(),
            next,
            flow_id,
            in_flight: false,
            otp: OtpEntry::new(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.sequencer.screen()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.sequencer.session()
    }

    #[must_use]
    pub fn field_error(&self) -> Option<&FieldError> {
        self.sequencer.field_error()
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.sequencer.alert()
    }

    /// Submit the welcome step: capture the username and fetch the primary
    /// methods available for it. An empty username never reaches the server.
    pub async fn submit_username(&mut self, username: &str) -> Progress {
        if self.sequencer.screen() != Screen::Welcome {
            return Progress::Stay;
        }
        let username = username.trim().to_string();
        if username.is_empty() {
            self.sequencer
                .step_failed(Field::Username, "Enter your username or email.");
            return Progress::Stay;
        }
        if !self.begin_request() {
            return Progress::Stay;
        }
        self.sequencer.username_submitted(&username);
        let result = self.client.login_options(&username).await;
        self.end_request();
        match result {
            Ok(options) => {
                let advance = self.sequencer.first_factor_options_loaded(options);
                self.apply(advance)
            }
            Err(err) => self.fail(Field::Username, &err),
        }
    }

    /// The user picked a primary method from the picker.
    pub fn choose_first_factor(&mut self, kind: FactorKind) -> Progress {
        let advance = self.sequencer.first_factor_chosen(kind);
        self.apply(advance)
    }

    /// Submit the password step.
    pub async fn submit_password(&mut self, password: SecretString) -> Progress {
        if self.sequencer.screen() != Screen::Password {
            return Progress::Stay;
        }
        if !self.begin_request() {
            return Progress::Stay;
        }
        self.sequencer.session_mut().password = Some(password.clone());
        let username = self.sequencer.session().username().to_string();
        let result = self.client.login_password(&username, &password).await;
        self.end_request();
        match result {
            Ok(outcome) => self.apply_outcome(&outcome),
            Err(err) => self.fail(Field::Password, &err),
        }
    }

    /// The one-time-code value changed (typing, paste, or autofill). A value
    /// of exactly six characters is submitted immediately; anything else
    /// performs no action.
    pub async fn totp_code_changed(&mut self, value: &str) -> Progress {
        if self.sequencer.screen() != Screen::Totp {
            return Progress::Stay;
        }
        let Some(code) = self.otp.on_change(value) else {
            return Progress::Stay;
        };
        self.verify_totp_code(code).await
    }

    /// Explicit submission of the current one-time code, e.g. pressing
    /// enter. Funnels through the same verification path as the automatic
    /// trigger.
    pub async fn submit_totp_code(&mut self) -> Progress {
        if self.sequencer.screen() != Screen::Totp {
            return Progress::Stay;
        }
        let Some(code) = self.otp.on_submit() else {
            return Progress::Stay;
        };
        self.verify_totp_code(code).await
    }

    async fn verify_totp_code(&mut self, code: String) -> Progress {
        if !otp::is_valid_code(&code) {
            self.sequencer.step_failed(
                Field::Totp,
                "Enter the 6-digit code from your authenticator app.",
            );
            return Progress::Stay;
        }
        // A racing duplicate trigger observes the in-flight request and is
        // dropped; the server remains the source of truth for idempotency.
        if !self.begin_request() {
            return Progress::Stay;
        }
        let code = SecretString::from(code);
        self.sequencer.session_mut().totp_code = Some(code.clone());
        let result = self.client.login_totp(&code).await;
        self.end_request();
        match result {
            Ok(outcome) => self.apply_outcome(&outcome),
            Err(err) => self.fail(Field::Totp, &err),
        }
    }

    /// Submit the recovery-code step.
    pub async fn submit_recovery_code(&mut self, code: &str) -> Progress {
        if self.sequencer.screen() != Screen::RecoveryCode {
            return Progress::Stay;
        }
        let code = code.trim().to_string();
        if code.is_empty() {
            self.sequencer
                .step_failed(Field::RecoveryCode, "Enter one of your recovery codes.");
            return Progress::Stay;
        }
        if !self.begin_request() {
            return Progress::Stay;
        }
        let code = SecretString::from(code);
        self.sequencer.session_mut().recovery_code = Some(code.clone());
        let result = self.client.login_recovery_code(&code).await;
        self.end_request();
        match result {
            Ok(outcome) => self.apply_outcome(&outcome),
            Err(err) => self.fail(Field::RecoveryCode, &err),
        }
    }

    /// Run the full security-key arc for the active screen: request a
    /// challenge, perform the platform ceremony, submit the signed
    /// assertion. On the second-factor screen this uses the security-key
    /// endpoints; on the passwordless screen it authenticates the captured
    /// username as the primary factor.
    pub async fn authenticate_security_key(
        &mut self,
        authenticator: &dyn Authenticator,
    ) -> Progress {
        let passwordless = match self.sequencer.screen() {
            Screen::Webauthn => false,
            Screen::WebauthnPasswordless => true,
            _ => return Progress::Stay,
        };
        if !self.begin_request() {
            return Progress::Stay;
        }

        let started = if passwordless {
            let username = self.sequencer.session().username().to_string();
            self.client.webauthn_passwordless_start(&username).await
        } else {
            self.client.webauthn_start().await
        };
        let bundle = match started {
            Ok(bundle) => bundle,
            Err(err) => return self.alert_failure(&err.field_message()),
        };

        let decoded = match webauthn::decode_challenge(&bundle) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(flow_id = %self.flow_id, %err, "challenge decode failed");
                return self.alert_failure("An error occurred during authentication.");
            }
        };

        let assertion = match authenticator.sign(&decoded) {
            Ok(assertion) => assertion,
            Err(err) => return self.alert_failure(&err.to_string()),
        };

        let credential = webauthn::encode_assertion(&assertion);
        let result = if passwordless {
            self.client.webauthn_passwordless_finish(&credential).await
        } else {
            self.client.webauthn_finish(&credential).await
        };
        self.end_request();
        match result {
            Ok(outcome) => self.apply_outcome(&outcome),
            Err(err) => {
                self.sequencer.step_alert(err.field_message());
                Progress::Stay
            }
        }
    }

    /// Fetch the text challenge for the PGP step. Returns `None` (with a
    /// step alert recorded) when the challenge could not be obtained.
    pub async fn fetch_pgp_challenge(&mut self) -> Option<String> {
        if self.sequencer.screen() != Screen::Pgp {
            return None;
        }
        if !self.begin_request() {
            return None;
        }
        let result = self.client.pgp_challenge().await;
        self.end_request();
        match result {
            Ok(challenge) => Some(challenge),
            Err(err) => {
                self.sequencer.step_alert(err.field_message());
                None
            }
        }
    }

    /// Submit the detached signature over the PGP challenge.
    pub async fn submit_pgp_signature(&mut self, signature: &str) -> Progress {
        if self.sequencer.screen() != Screen::Pgp {
            return Progress::Stay;
        }
        let signature = signature.trim().to_string();
        if signature.is_empty() {
            self.sequencer.step_failed(
                Field::PgpSignature,
                "Sign the challenge with your PGP key and paste the signature.",
            );
            return Progress::Stay;
        }
        if !self.begin_request() {
            return Progress::Stay;
        }
        let username = self.sequencer.session().username().to_string();
        let result = self.client.login_pgp(&username, &signature).await;
        self.end_request();
        match result {
            Ok(outcome) => self.apply_outcome(&outcome),
            Err(err) => self.fail(Field::PgpSignature, &err),
        }
    }

    /// The user picked a second-factor method from the picker.
    pub fn choose_second_factor(&mut self, kind: FactorKind) -> Progress {
        let advance = self.sequencer.second_factor_chosen(kind);
        self.apply(advance)
    }

    /// "More options" on a second-factor screen.
    pub fn more_options(&mut self) -> Progress {
        let advance = self.sequencer.more_second_factor_options();
        self.apply(advance)
    }

    /// Back out of a non-password primary screen.
    pub fn back_to_first_factor_choice(&mut self) -> Progress {
        let advance = self.sequencer.back_to_first_factor_choice();
        self.apply(advance)
    }

    /// "Not you?" on the password screen.
    pub fn switch_account(&mut self) -> Progress {
        let advance = self.sequencer.switch_account();
        self.apply(advance)
    }

    fn apply_outcome(&mut self, outcome: &LoginOutcome) -> Progress {
        let advance = self.sequencer.authentication_succeeded(outcome);
        self.apply(advance)
    }

    fn apply(&mut self, advance: Advance) -> Progress {
        match advance {
            Advance::Stay => Progress::Stay,
            Advance::Next(screen) => {
                if screen == Screen::Totp {
                    self.otp.reset();
                }
                Progress::Screen(screen)
            }
            Advance::Authenticated => {
                let destination = success::resolve_destination(self.next.as_deref());
                info!(flow_id = %self.flow_id, destination = %destination, "login complete");
                Progress::Redirect(destination)
            }
        }
    }

    fn fail(&mut self, field: Field, err: &ApiError) -> Progress {
        self.sequencer.step_failed(field, err.field_message());
        Progress::Stay
    }

    fn alert_failure(&mut self, message: &str) -> Progress {
        self.end_request();
        self.sequencer.step_alert(message);
        Progress::Stay
    }

    fn begin_request(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    fn end_request(&mut self) {
        self.in_flight = false;
    }
}
