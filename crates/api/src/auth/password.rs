//! Credential hashing and verification.
//!
//! New hashes are bcrypt (`$2b$`) with a configurable cost, the family
//! existing account rows were written with. Verification dispatches on the
//! stored prefix and also accepts Argon2id PHC strings.

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;

/// Cost used when none is configured.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Lowest and highest cost bcrypt accepts.
const COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidCost(u32),

    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("argon2 error: {0}")]
    Argon2(argon2::password_hash::Error),

    #[error("Unrecognized password hash format")]
    UnknownFormat,
}

/// Hashes account passwords with bcrypt at a fixed cost.
///
/// Hashing is CPU-bound; async callers run it on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Result<Self, CredentialError> {
        if !COST_RANGE.contains(&cost) {
            return Err(CredentialError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn work_factor(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only for malformed hashes.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        if hash.starts_with("$2") {
            return Ok(bcrypt::verify(password, hash)?);
        }
        if hash.starts_with("$argon2") {
            let parsed = PasswordHash::new(hash).map_err(CredentialError::Argon2)?;
            return match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(CredentialError::Argon2(e)),
            };
        }
        Err(CredentialError::UnknownFormat)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}
