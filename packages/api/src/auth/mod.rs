//! Email + password accounts.
//!
//! Registration rules live here so the routes and the tests share them;
//! hashing is in [`password`] and the session glue in [`session`].

mod password;
mod session;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use session::{current_user_id, sign_in, sign_out, SESSION_USER_ID_KEY};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Trimmed, lowercased email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Name to store for a new account: the given one if non-blank, else the
/// local part of the email.
pub fn default_name(email: &str, name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => email.split('@').next().unwrap_or_default().to_string(),
    }
}

/// Check a normalized email and a raw password against the registration rules.
pub fn validate_registration(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_rules() {
        assert_eq!(validate_registration("a@b.c", "longenough"), Ok(()));
        assert_eq!(
            validate_registration("not-an-email", "longenough"),
            Err(AuthError::InvalidEmail)
        );
        assert_eq!(validate_registration("", "longenough"), Err(AuthError::InvalidEmail));
        assert_eq!(
            validate_registration("a@b.c", "short"),
            Err(AuthError::PasswordTooShort)
        );
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn name_falls_back_to_local_part() {
        assert_eq!(default_name("ada@example.com", None), "ada");
        assert_eq!(default_name("ada@example.com", Some("   ")), "ada");
        assert_eq!(default_name("ada@example.com", Some(" Ada L. ")), "Ada L.");
    }
}
