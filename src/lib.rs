//! # Ensaluti (Multi-Factor Login Flow Client)
//!
//! `ensaluti` drives a user through a multi-step sign-in conversation against
//! an identity provider: username submission, primary-factor verification
//! (password, passkey, or PGP key), and a conditional second factor (one-time
//! code, recovery code, or hardware security key).
//!
//! ## Flow Model
//!
//! The flow is a strict finite-state machine over [`flow::Screen`] values.
//! Server responses are translated into typed results at the API boundary and
//! fed to the sequencer, which owns the single authoritative screen value and
//! the session state. Events that do not apply to the active screen are
//! ignored rather than rejected, so out-of-order or stale results can never
//! corrupt the flow.
//!
//! - **Skip logic:** a single available factor is entered directly, for both
//!   first- and second-factor option sets; a remembered recent second factor
//!   skips the picker when it is still offered.
//! - **Failure policy:** a failed request never advances the screen. The
//!   error is attached to the active step's input field and every retry is
//!   user-initiated.
//!
//! ## Security Boundaries
//!
//! - Entered secrets (password, one-time code, recovery code) are held as
//!   [`secrecy::SecretString`], live only while their step is active, and are
//!   never logged.
//! - The post-login destination accepts same-origin relative paths only;
//!   absolute and protocol-relative URLs fall back to `/`.
//! - WebAuthn challenge and assertion fields cross the wire as base64url
//!   text and are decoded/encoded byte-for-byte symmetrically.

pub mod api;
pub mod cli;
pub mod flow;
pub mod webauthn;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
