//! Password digest helpers for the authentication endpoint.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a candidate password against a stored digest.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password) == password_hash
}
