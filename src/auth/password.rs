//! Password hashing and verification.
//!
//! bcrypt at a fixed cost factor; deliberately expensive to resist brute
//! force. Neither function logs or returns the plaintext or the hash.
//! Callers run these under `spawn_blocking` since they are CPU-bound.

use tracing::error;

pub const HASH_COST: u32 = 10;

/// Hash a plaintext password with a per-hash random salt.
///
/// # Errors
///
/// Returns an error if bcrypt fails to produce a hash.
pub fn hash(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, HASH_COST)
}

/// Verify a plaintext password against a stored hash. A malformed stored
/// hash counts as a failed verification, not an error.
#[must_use]
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or_else(|err| {
        error!("Password verification failed: {err}");
        false
    })
}
