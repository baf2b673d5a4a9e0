//! Box View API: convert a hosted document and open short-lived viewer sessions.
//!
//! Authentication uses the application's API token from process configuration,
//! not a per-user identity.
pub mod client;
pub mod types;

pub use client::{BoxViewApi, BoxViewApp};
