//! Content hashing used for cache keys, document ids and chunk ids

use sha2::{Digest, Sha256};

/// Hash raw bytes into a lowercase hex SHA-256 digest
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash text content
///
/// Pure function of the text: identical content yields the same id on any
/// machine and in any run.
pub fn hash_content(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("hello world"), hash_content("hello world"));
        assert_ne!(hash_content("hello world"), hash_content("hello  world"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_content(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_bytes(b"abc"), hash_content("abc"));
        assert_eq!(hash_content("abc").len(), 64);
    }
}
