//! Shared SHA-256 hex digest utility.
//!
//! Used for refresh-token storage, blacklist keys, and device fingerprints so
//! the same digest is computed symmetrically at write and read time.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
