//! Password hashing using Argon2.
//!
//! The same hasher protects account passwords and one-time passcodes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use std::sync::Arc;
use tracing::debug;
use trimly_core::{TrimlyError, TrimlyResult};

/// Argon2id hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
}

impl PasswordHasher {
    /// Creates a new password hasher with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    /// Creates a new password hasher with custom parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        Self {
            argon2: Arc::new(argon2),
        }
    }

    /// Minimal-cost parameters for tests and local seeding.
    #[must_use]
    pub fn lightweight() -> Self {
        let params = Params::new(Params::MIN_M_COST * 8, 1, 1, None).unwrap_or(Params::DEFAULT);
        Self::with_params(params)
    }

    /// Hashes a secret.
    pub fn hash(&self, secret: &str) -> TrimlyResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| TrimlyError::Internal(format!("Failed to hash secret: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verifies a secret against a stored hash.
    pub fn verify(&self, secret: &str, hash: &str) -> TrimlyResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| TrimlyError::Internal(format!("Invalid hash format: {}", e)))?;

        match self.argon2.verify_password(secret.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Secret verification failed: mismatch");
                Ok(false)
            }
            Err(e) => Err(TrimlyError::Internal(format!("Verification error: {}", e))),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::lightweight();
        let hash = hasher.hash("salon2025").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("salon2025", &hash).unwrap());
        assert!(!hasher.verify("salon2024", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::lightweight();
        let a = hasher.hash("123456").unwrap();
        let b = hasher.hash("123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_default_hasher_verifies_lightweight_hash() {
        let hash = PasswordHasher::lightweight().hash("secret99").unwrap();
        assert!(PasswordHasher::new().verify("secret99", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let hasher = PasswordHasher::lightweight();
        assert!(hasher.verify("x", "not-a-hash").is_err());
    }
}
