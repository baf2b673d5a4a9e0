//! Password hashing and session tokens.
//!
//! Passwords are hashed with Argon2id into a PHC string (salt embedded).
//! Plaintext only ever lives in a [`Zeroizing`] buffer owned by the caller.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pledge_common::{PledgeError, Result};
use rand::RngCore;
use zeroize::Zeroizing;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Random bytes behind each session token (256 bits).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Enforce the length policy on a plaintext password.
pub fn check_password_policy(plaintext: &str) -> Result<()> {
    if plaintext.chars().count() < MIN_PASSWORD_LEN {
        return Err(PledgeError::validation(
            "password",
            format!("is too short (minimum is {MIN_PASSWORD_LEN} characters)"),
        ));
    }
    Ok(())
}

/// Validate and hash a plaintext password; `None` means a passwordless account.
pub fn set_credential(plaintext: Option<Zeroizing<String>>) -> Result<Option<String>> {
    match plaintext {
        None => Ok(None),
        Some(p) => {
            check_password_policy(&p)?;
            hash_password(&p).map(Some)
        }
    }
}

pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PledgeError::Storage(format!("password hashing failed: {e}")))
}

/// `true` iff `plaintext` matches the stored PHC hash.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error=%e, "credentials.unparseable_hash");
            false
        }
    }
}

/// Opaque URL-safe token, issued once per account at registration.
pub fn issue_session_token() -> String {
    let mut bytes = Zeroizing::new([0u8; SESSION_TOKEN_BYTES]);
    rand::rngs::OsRng.fill_bytes(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(&bytes[..])
}
