//! Social network and document-viewer clients used by Pledge.
//!
//! Each provider lives in its own module with a thin client over
//! [`pledge_http::HttpClient`] and serde models for the wire format:
//!
//! - [`twitter`]: status updates and direct messages, signed with OAuth 1.0a
//! - [`linkedin`]: mailbox messages authenticated by an OAuth 2 access token
//! - [`boxview`]: Box View documents and viewer sessions
//!
//! None of the clients retry on their own; callers decide.
pub mod boxview;
pub mod linkedin;
pub mod oauth1;
pub mod twitter;

use pledge_http::HttpError;
use std::time::Duration;

/// Errors raised by the provider clients.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The provider answered with a success status but not with what we asked for.
    #[error("unexpected provider response: {message}")]
    Unexpected { message: String, payload: String },
}

impl SocialError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SocialError::Http(e) => e.status().map(|s| s.as_u16()),
            SocialError::Unexpected { .. } => None,
        }
    }

    /// Raw provider payload for diagnostics.
    pub fn payload(&self) -> String {
        match self {
            SocialError::Http(e) => e.raw_payload(),
            SocialError::Unexpected { payload, .. } => payload.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SocialError>;

/// Build a provider HTTP client: no retries, caller-chosen timeout.
pub(crate) fn provider_http(endpoint: &str, timeout: Duration) -> Result<pledge_http::HttpClient> {
    let endpoint = if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    };
    Ok(pledge_http::HttpClient::new(&endpoint)?
        .with_timeout(timeout)
        .with_retries(0))
}
