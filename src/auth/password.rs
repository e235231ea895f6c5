//! Salted password hashing with bcrypt (`$2b$` modular-crypt strings).

use crate::error::ServiceResult;

#[cfg(not(test))]
const COST: u32 = bcrypt::DEFAULT_COST;
// Minimum cost keeps the hashing suites fast.
#[cfg(test)]
const COST: u32 = 4;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    Ok(bcrypt::hash(password, COST)?)
}

/// Check `password` against a hash produced by [`hash_password`].
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
