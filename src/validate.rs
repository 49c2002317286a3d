//! Field checks shared by the record modules. Messages are user-facing.

use crate::errors::RecordError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn amount(value: Option<f64>) -> Result<f64, RecordError> {
    let value = value.ok_or_else(|| RecordError::invalid("Amount is required"))?;
    if !value.is_finite() {
        return Err(RecordError::invalid("Amount must be a number"));
    }
    if value <= 0.0 {
        return Err(RecordError::invalid("Amount must be positive"));
    }
    Ok(value)
}

pub fn date<T>(value: Option<T>, message: &str) -> Result<T, RecordError> {
    value.ok_or_else(|| RecordError::invalid(message))
}

/// Trims `value` and rejects it when nothing is left.
pub fn required(value: &str, message: &str) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::invalid(message));
    }
    Ok(trimmed.to_string())
}

pub fn email(value: &str) -> Result<(), RecordError> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(RecordError::invalid("Please enter a valid email address"))
    }
}

/// Username, email and password rules for any new account.
pub fn credentials(username: &str, email_addr: &str, password: &str) -> Result<(), RecordError> {
    if username.trim().is_empty() || email_addr.trim().is_empty() || password.trim().is_empty() {
        return Err(RecordError::invalid("All fields are required"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(RecordError::invalid("Username must be at least 3 characters"));
    }
    email(email_addr)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RecordError::invalid("Password must be at least 6 characters"));
    }
    Ok(())
}
