//! Password hashing.

use anyhow::{Context, Result};

/// bcrypt work factor. Policy constant, matches the registry-wide setting.
const BCRYPT_COST: u32 = 10;

/// Hash a password using bcrypt with a fresh salt.
pub fn hash(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("hashing password")
}

/// Verify a password against a bcrypt hash.
pub fn verify(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("verifying password")
}
