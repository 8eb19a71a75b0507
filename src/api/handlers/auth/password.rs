//! Password hashing policy.
//!
//! Argon2id with the crate defaults, producing PHC-format strings. Hashing is
//! salted per call, so two hashes of the same input differ; comparison must go
//! through [`PasswordPolicy::verify`], never string equality.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::error::AuthError;

pub struct PasswordPolicy {
    // Verified when no credential record exists, so the negative login path
    // costs the same as a real password check.
    dummy_hash: String,
}

impl PasswordPolicy {
    pub fn new() -> Result<Self, AuthError> {
        let dummy_hash = hash_plaintext("bennu-dummy-password")?;
        Ok(Self { dummy_hash })
    }

    /// Hash a plaintext password. Failure here is fatal to the calling request.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        hash_plaintext(plaintext)
    }

    /// Check a plaintext against a stored PHC hash.
    ///
    /// A malformed hash is a normal negative result, not an error.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn a verification's worth of work without a real credential record.
    pub fn verify_dummy(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.dummy_hash);
    }
}

fn hash_plaintext(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(anyhow!("failed to hash password: {err}")))
}
