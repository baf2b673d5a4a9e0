//! Format checks that run before anything touches the database.
//!
//! Uniqueness is checked by [`crate::accounts`] against the store; everything
//! here is pure.
use crate::credentials::check_password_policy;
use pledge_common::FieldError;
use regex::Regex;
use std::sync::OnceLock;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static LOGIN_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_+\-.]+@[A-Za-z0-9\-.]+\.[A-Za-z]+$").expect("valid email pattern")
    })
}

fn login_re() -> &'static Regex {
    LOGIN_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid login pattern"))
}

/// `local@domain.tld` in ASCII only. The store folds case with SQLite
/// `NOCASE`, which ignores anything outside ASCII.
pub fn is_valid_email(value: &str) -> bool {
    email_re().is_match(value)
}

pub fn validate_email(value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new("email", "can't be blank"))
    } else if !is_valid_email(value.trim()) {
        Some(FieldError::new("email", "is invalid"))
    } else {
        None
    }
}

pub fn validate_login(value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new("login", "can't be blank"))
    } else if !login_re().is_match(value.trim()) {
        Some(FieldError::new("login", "is invalid"))
    } else {
        None
    }
}

/// Every format rule a registration must satisfy, reported together.
pub fn registration_errors(
    email: &str,
    login: Option<&str>,
    password: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(validate_email(email));
    if let Some(login) = login {
        errors.extend(validate_login(login));
    }
    if let Some(password) = password {
        if let Err(e) = check_password_policy(password) {
            errors.extend(e.field_errors().iter().cloned());
        }
    }
    errors
}
