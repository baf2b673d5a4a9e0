//! Twitter/X API integration used for outbound messages.
//!
//! Calls are made in user context: every request is signed with the
//! application's consumer keys plus the linked identity's access token pair.
pub mod client;
pub mod types;

pub use client::{TwitterApi, TwitterApp, is_valid_handle};
