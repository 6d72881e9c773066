//! services/api/src/adapters/password.rs
//!
//! Argon2id password digests implementing the `PasswordDigest` port.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use dealership_core::ports::{PasswordDigest, PortError, PortResult};

#[derive(Default, Clone)]
pub struct Argon2Digest;

impl PasswordDigest for Argon2Digest {
    fn digest(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, password: &str, digest: &str) -> PortResult<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}
