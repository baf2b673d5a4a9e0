//! Common types and utilities shared across Pledge crates.
//!
//! This crate defines the shared error type, the provider vocabulary and the
//! observability helpers used throughout the Pledge workspace. It is
//! intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`PledgeError`] and [`Result`]: Shared error handling
//! - [`FieldError`]: One failed validation rule, reported in bulk
//! - [`Provider`]: Third-party services a user may link an identity for
//! - [`observability`]: Centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Parsing a provider name coming from an OAuth callback:
//!
//! ```rust
//! use pledge_common::Provider;
//!
//! let p: Provider = "Twitter".parse().unwrap();
//! assert_eq!(p, Provider::Twitter);
//! assert_eq!(p.as_str(), "twitter");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Third-party services an account can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Twitter,
    Linkedin,
    Box,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Twitter => "twitter",
            Provider::Linkedin => "linkedin",
            Provider::Box => "box",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(Provider::Twitter),
            "linkedin" => Ok(Provider::Linkedin),
            "box" => Ok(Provider::Box),
            other => Err(PledgeError::validation(
                "provider",
                format!("unknown provider '{other}'"),
            )),
        }
    }
}

/// A single rule that an input failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error types used across the Pledge system.
#[derive(thiserror::Error, Debug)]
pub enum PledgeError {
    /// Input was rejected before anything was persisted or sent.
    #[error("validation failed: {}", join_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    /// The acting user has no stored identity for the provider.
    #[error("no linked {provider} identity")]
    NoLinkedIdentity { provider: Provider },

    /// A provider API answered with a non-success status or an unreadable body.
    #[error("{provider} call failed (status {status:?}): {payload}")]
    ProviderCallFailed {
        provider: Provider,
        status: Option<u16>,
        /// Raw response body (or transport error text) kept for diagnostics.
        payload: String,
    },

    /// The policy evaluator denied the requested action.
    #[error("not authorized to {action}")]
    NotAuthorized { action: String },

    /// Login/email and password did not match a stored credential.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A referenced record could not be located.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The backing store reported an error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PledgeError {
    /// Shorthand for a single-field [`PledgeError::ValidationFailed`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PledgeError::ValidationFailed(vec![FieldError::new(field, message)])
    }

    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        PledgeError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Field errors carried by a validation failure, empty for other kinds.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            PledgeError::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

/// Convenient alias for results that use [`PledgeError`].
pub type Result<T> = std::result::Result<T, PledgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip_through_display() {
        for p in [Provider::Twitter, Provider::Linkedin, Provider::Box] {
            assert_eq!(p.to_string().parse::<Provider>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_provider_is_a_validation_error() {
        let err = "myspace".parse::<Provider>().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "provider");
    }

    #[test]
    fn validation_message_lists_every_field() {
        let err = PledgeError::ValidationFailed(vec![
            FieldError::new("email", "is invalid"),
            FieldError::new("password", "is too short"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: email is invalid, password is too short"
        );
    }
}
