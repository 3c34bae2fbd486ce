//! Cryptographic utilities for device-identity hashing and nonce generation.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
///
/// Used to normalize raw device identifiers into the device-identity hash
/// stored on attendance records.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a random nonce of `len` bytes, hex-encoded.
///
/// Prefers OS randomness; falls back to the thread-local PRNG if the OS
/// source is unavailable.
pub fn random_nonce(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    if OsRng.try_fill_bytes(&mut bytes).is_err() {
        rand::thread_rng().fill(&mut bytes[..]);
    }
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        assert_ne!(sha256_hex("device-a"), sha256_hex("device-b"));
    }

    #[test]
    fn test_random_nonce_length() {
        // Hex-encoded, so twice the byte length.
        assert_eq!(random_nonce(16).len(), 32);
        assert_eq!(random_nonce(32).len(), 64);
    }

    #[test]
    fn test_random_nonce_unique() {
        assert_ne!(random_nonce(16), random_nonce(16));
    }

    #[test]
    fn test_random_nonce_is_hex() {
        let nonce = random_nonce(16);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
