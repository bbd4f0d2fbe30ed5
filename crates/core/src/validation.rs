// Input validation for auth forms
//
// Runs before any provider call. Messages are shown to the user verbatim.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::AuthError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const LOGIN_FIELDS_REQUIRED: &str = "Please fill in all fields";
pub const REGISTRATION_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validate login input: both fields present
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if is_blank(email) || password.is_empty() {
        return Err(AuthError::validation(LOGIN_FIELDS_REQUIRED));
    }
    Ok(())
}

/// Validate registration input: all fields present, plausible email, long enough password
pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), AuthError> {
    if is_blank(email) || password.is_empty() || is_blank(name) {
        return Err(AuthError::validation(REGISTRATION_FIELDS_REQUIRED));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(PASSWORD_TOO_SHORT));
    }
    if !email_pattern().is_match(email.trim()) {
        return Err(AuthError::validation(EMAIL_INVALID));
    }
    Ok(())
}

/// Validate password recovery input
pub fn validate_recovery(email: &str) -> Result<(), AuthError> {
    if is_blank(email) {
        return Err(AuthError::validation(EMAIL_REQUIRED));
    }
    if !email_pattern().is_match(email.trim()) {
        return Err(AuthError::validation(EMAIL_INVALID));
    }
    Ok(())
}
