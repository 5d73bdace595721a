//! # Password hashing and verification
//!
//! - [`hash_password`] salts with [`OsRng`] and hashes with the default
//!   Argon2id parameters, returning a PHC string such as
//!   `$argon2id$v=19$m=19456,t=2,p=1$...`. That string is what the
//!   `users.password_hash` column holds.
//! - [`verify_password`] parses a stored PHC string and checks a plaintext
//!   against it. A mismatch is `Ok(false)`; only a malformed hash is an error.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::AuthError;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
