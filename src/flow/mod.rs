//! Login flow controller.
//!
//! Flow Overview:
//! 1) The welcome step captures a username and fetches the primary methods
//!    available for it.
//! 2) The chosen primary factor verifies the user: password, passkey, or
//!    PGP key.
//! 3) When the server requires a second factor, the sequencer either skips
//!    straight to a single or recently used method or shows the picker; the
//!    user verifies with a one-time code, recovery code, or security key.
//! 4) A fully satisfied login resolves the post-login destination and
//!    leaves the flow.
//!
//! The sequencer owns all mutable flow state; step handlers drive it with
//! typed results from the API boundary.

mod handlers;
mod otp;
mod screen;
mod sequencer;
mod session;
mod success;

pub use handlers::{LoginFlow, Progress};
pub use otp::{is_valid_code, OtpEntry, OTP_CODE_LEN};
pub use screen::{FactorKind, Screen};
pub use sequencer::{Advance, Field, FieldError, Sequencer};
pub use session::Session;
pub use success::{resolve_destination, DEFAULT_LANDING_PATH};
