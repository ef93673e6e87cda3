//! Correlation ids and shared-secret comparison.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a request correlation id: 6 random bytes, hex-encoded
/// (12 characters).
pub fn new_request_id() -> String {
    let bytes: [u8; 6] = rand::rng().random();
    hex::encode(bytes)
}

/// Compare a presented secret against the expected one.
///
/// Both sides are hashed to equal-length digests and compared in
/// constant time.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}
