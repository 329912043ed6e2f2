//! Checksum validation for migrations
//!
//! SHA256 of the migration SQL, recorded when applied and re-checked on every
//! run so an edited migration is caught.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
