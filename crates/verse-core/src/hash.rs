//! Content hashing for generated illustrations

use sha2::{Digest, Sha256};
use std::fmt;

const PREFIX: &str = "sha256:";

/// SHA-256 digest of an illustration's bytes.
///
/// Recorded in the provenance manifest so a reviewer can tell whether the
/// file on disk is still the one the provider returned.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte slice
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Lowercase hex digest
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Hex digest with an algorithm prefix (e.g., "sha256:abcdef...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("{}{}", PREFIX, self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        assert_eq!(ContentHash::of(b"png"), ContentHash::of(b"png"));
        assert_ne!(ContentHash::of(b"png"), ContentHash::of(b"jpg"));
    }

    #[test]
    fn test_known_digest() {
        let h = ContentHash::of(b"");
        assert_eq!(
            h.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_prefixed_hex() {
        let prefixed = ContentHash::of(b"verse-01.png").to_prefixed_hex();
        assert!(prefixed.starts_with("sha256:"));
        assert_eq!(prefixed.len(), "sha256:".len() + 64);
    }
}
