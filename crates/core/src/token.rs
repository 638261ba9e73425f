//! Opaque token primitives: secure random generation, one-way hashing,
//! constant-time comparison, CSRF tokens, and device fingerprints.
//!
//! Refresh and CSRF tokens are opaque random hex strings; only the SHA-256
//! hash of a refresh token is ever persisted, so a database leak does not
//! compromise active sessions.

use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::hashing::sha256_hex;

/// Entropy for refresh tokens: 48 random bytes (96 hex chars).
pub const REFRESH_TOKEN_BYTES: usize = 48;

/// Entropy for CSRF tokens: 32 random bytes (64 hex chars).
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Generate `byte_length` cryptographically secure random bytes, hex-encoded.
pub fn generate_secure_token(byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute the SHA-256 hex digest of a token for at-rest storage.
///
/// Lookups re-hash the presented token and compare against the stored digest.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Re-hash `token` and compare against `stored_hash` in constant time.
pub fn compare_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed = hash_token(token);
    constant_time_eq(&computed, stored_hash)
}

/// Constant-time string equality, avoiding timing side channels.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Generate a CSRF token, independent of any session or refresh token.
pub fn generate_csrf_token() -> String {
    generate_secure_token(CSRF_TOKEN_BYTES)
}

/// Derive a device fingerprint from the user agent and origin IP.
///
/// Both inputs are client-controlled, so this is a heuristic signal for
/// anomaly detection, not a security boundary.
pub fn derive_device_fingerprint(user_agent: &str, ip: &str) -> String {
    sha256_hex(format!("{user_agent}|{ip}").as_bytes())
}
