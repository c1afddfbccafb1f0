//! Credential codec: one-way password hashing and verification.
//!
//! Bcrypt embeds the salt and cost in the digest, so the same plaintext hashed
//! twice yields different strings and equality is never checked by comparing
//! digests directly.

use bcrypt::BcryptError;

/// hash
///
/// One-way, salted, tunable-cost transform of a plaintext password.
/// The cost comes from configuration (BCRYPT_COST); bcrypt generates a fresh
/// random salt per call.
pub fn hash(plaintext: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// verify
///
/// Recomputes the digest using the salt embedded in `digest` and compares.
/// Fails closed: a malformed digest yields `false` rather than an error, so a
/// corrupted stored hash can never bypass denial.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}
