//! Password value object - Domain layer password handling.
//!
//! Hashes are Argon2id PHC strings: algorithm, version, cost parameters,
//! salt and digest travel together, so no separate salt column is needed.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{DomainError, DomainResult};

/// Stored credential: an Argon2id PHC string. The plaintext never outlives
/// the call that hashes it.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain-text password with a fresh salt. Empty input is a
    /// validation error; any other string, including unicode, is accepted.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        if plain_text.is_empty() {
            return Err(DomainError::validation("Password must not be empty"));
        }

        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Wrap a PHC string loaded from storage. Not validated until `verify`.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// A real hash of a random secret nobody knows, computed once per process.
    ///
    /// Verifying against it costs the same as verifying a stored hash, which
    /// keeps "unknown account" and "wrong password" indistinguishable by timing.
    /// Call it once at startup so the first lookup miss does not also pay
    /// for building it.
    pub fn decoy() -> Self {
        static DECOY: OnceLock<String> = OnceLock::new();
        let hash = DECOY.get_or_init(|| {
            let secret = SaltString::generate(&mut OsRng);
            Self::hash(secret.as_str()).unwrap_or_default()
        });
        Self::from_hash(hash.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// Malformed hashes and verifier errors count as a mismatch.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    fn hash(plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    // The digest comparison inside `verify_password` is constant time.
    fn verify_hash(plain_text: &str, hash: &str) -> DomainResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DomainError::password(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    /// Argon2id with the crate's default cost parameters.
    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}
