//! LinkedIn mailbox messaging.
pub mod client;
pub mod types;

pub use client::LinkedinApi;
