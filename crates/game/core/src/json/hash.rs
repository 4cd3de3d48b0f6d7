//! Content hash over canonical value tree strings.

use std::fmt;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a canonical string.
///
/// Used for consistency checks between what was sent and what arrived; there
/// is no secret key, so it proves nothing about who produced the payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes the given canonical string.
    pub fn of(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex chars, for compact logging.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(16);
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_hex() {
        let first = ContentHash::of(r#"{"a":1}"#);
        let second = ContentHash::of(r#"{"a":1}"#);
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first.short().len(), 16);
    }

    #[test]
    fn hash_changes_with_content() {
        assert_ne!(ContentHash::of(r#"{"a":1}"#), ContentHash::of(r#"{"a":2}"#));
    }
}
