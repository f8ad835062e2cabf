//! Anti-forgery nonce generation
//!
//! A nonce is minted per session request, stored in the browser and embedded
//! in the session metadata. The callback is only trusted when both copies
//! come back identical.

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes behind each nonce (hex-encoded to 64 chars)
pub const NONCE_BYTES: usize = 32;

/// Source of single-use anti-forgery tokens
pub trait NonceSource: Send + Sync {
    /// Produce a fresh, non-empty token. Never returns a previously issued value.
    fn generate(&self) -> String;
}

/// Nonce source backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn generate(&self) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nonce_is_hex_of_expected_length() {
        let nonce = OsNonceSource.generate();
        assert_eq!(nonce.len(), NONCE_BYTES * 2);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_nonces_are_pairwise_distinct() {
        let source = OsNonceSource;
        let nonces: HashSet<String> = (0..1000).map(|_| source.generate()).collect();
        assert_eq!(nonces.len(), 1000);
        assert!(nonces.iter().all(|n| !n.is_empty()));
    }
}
