//! Hashing Utilities

use sha2::{Digest, Sha256};

/// Compute SHA-256 of raw bytes and return it as a hex string
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// First 12 hex characters of a hash, for log lines
pub fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let hash = content_hash(b"hello world");
        assert_eq!(hash.len(), 64);
        assert_eq!(content_hash(b"hello world"), content_hash(b"hello world"));
        assert_ne!(content_hash(b"hello world"), content_hash(b"hello world!"));
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(
            content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(short_hash("2cf24dba5fb0a30e"), "2cf24dba5fb0");
        assert_eq!(short_hash("abc"), "abc");
    }
}
