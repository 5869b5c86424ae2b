use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::ApiError;

/// Argon2id password hashing with a configurable work factor.
#[derive(Clone)]
pub struct Credentials {
    params: Params,
}

impl Credentials {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("invalid Argon2 parameters: {}", e))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Salted one-way hash in PHC string format. Expensive; call it off the
    /// async executor.
    pub fn hash(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// Fails closed: a malformed stored hash is a mismatch, not an error.
    /// Parameters are read from the hash itself, so hashes made under an
    /// older work factor still verify.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.hasher()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
