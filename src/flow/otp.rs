//! One-time-code entry with automatic submission.
//!
//! The one-time-code step is the one place where submission is not purely
//! user-driven: every change of the code value (typing, paste, autofill) is
//! evaluated, and a value of exactly six characters is submitted immediately.
//! Automatic submission fires at most once per distinct value; an explicit
//! submit (pressing enter) funnels through the same path and may resubmit the
//! current value, with the flow-level in-flight guard absorbing the race
//! between the two triggers.

use regex::Regex;

/// Required length of a one-time code.
pub const OTP_CODE_LEN: usize = 6;

/// Codes are digits only; anything else is rejected before a request is made.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    Regex::new(r"^[0-9]{6}$").is_ok_and(|regex| regex.is_match(code))
}

#[derive(Debug, Default)]
pub struct OtpEntry {
    value: String,
    last_auto_submitted: Option<String>,
}

impl OtpEntry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Record a changed code value. Returns the code to submit when the new
    /// value has exactly six characters and has not been auto-submitted
    /// already; any other length performs no action.
    pub fn on_change(&mut self, value: &str) -> Option<String> {
        self.value = value.to_string();
        if self.value.len() != OTP_CODE_LEN {
            return None;
        }
        if self.last_auto_submitted.as_deref() == Some(self.value.as_str()) {
            return None;
        }
        self.last_auto_submitted = Some(self.value.clone());
        Some(self.value.clone())
    }

    /// Explicit submission of the current value. Equivalent to the automatic
    /// trigger but not deduplicated, so the user can retry a rejected code.
    pub fn on_submit(&mut self) -> Option<String> {
        if self.value.len() != OTP_CODE_LEN {
            return None;
        }
        self.last_auto_submitted = Some(self.value.clone());
        Some(self.value.clone())
    }

    /// Forget the entry, e.g. when the one-time-code step is re-entered.
    pub fn reset(&mut self) {
        self.value.clear();
        self.last_auto_submitted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_distinct_six_character_value() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.on_change("123456"), Some("123456".to_string()));
        // The same value changing "again" (e.g. a re-render) does not refire.
        assert_eq!(entry.on_change("123456"), None);
        assert_eq!(entry.on_change("654321"), Some("654321".to_string()));
    }

    #[test]
    fn never_fires_for_other_lengths() {
        let mut entry = OtpEntry::new();
        for value in ["", "1", "12345", "1234567", "12345678"] {
            assert_eq!(entry.on_change(value), None, "fired for {value:?}");
        }
    }

    #[test]
    fn pasted_value_fires_immediately() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.on_change("987654"), Some("987654".to_string()));
    }

    #[test]
    fn manual_submit_can_retry_the_same_value() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.on_change("123456"), Some("123456".to_string()));
        assert_eq!(entry.on_submit(), Some("123456".to_string()));
    }

    #[test]
    fn manual_submit_requires_a_full_code() {
        let mut entry = OtpEntry::new();
        entry.on_change("123");
        assert_eq!(entry.on_submit(), None);
    }

    #[test]
    fn reset_allows_the_same_code_to_fire_again() {
        let mut entry = OtpEntry::new();
        assert_eq!(entry.on_change("123456"), Some("123456".to_string()));
        entry.reset();
        assert_eq!(entry.on_change("123456"), Some("123456".to_string()));
    }

    #[test]
    fn code_validation_requires_six_digits() {
        assert!(is_valid_code("123456"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("12345a"));
        assert!(!is_valid_code("12 456"));
    }
}
