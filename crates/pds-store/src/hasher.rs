use pds_types::EntryHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"pds-diff-v1"`) that is prepended
/// to every hash computation, so a diff entry and a snapshot with identical
/// bytes still hash differently.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for diff entries.
    pub const DIFF: Self = Self {
        domain: "pds-diff-v1",
    };
    /// Hasher for snapshots.
    pub const SNAPSHOT: Self = Self {
        domain: "pds-snapshot-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> EntryHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        EntryHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &EntryHash) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            ContentHasher::DIFF.hash(b"hello"),
            ContentHasher::DIFF.hash(b"hello")
        );
    }

    #[test]
    fn domains_separate_hashes() {
        assert_ne!(
            ContentHasher::DIFF.hash(b"same"),
            ContentHasher::SNAPSHOT.hash(b"same")
        );
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::DIFF.hash(b"original");
        assert!(ContentHasher::DIFF.verify(b"original", &id));
        assert!(!ContentHasher::DIFF.verify(b"tampered", &id));
    }

    #[test]
    fn domain_hash_differs_from_raw() {
        assert_ne!(
            ContentHasher::DIFF.hash(b"x"),
            EntryHash::from_bytes(b"x")
        );
        assert_eq!(ContentHasher::new("custom").domain(), "custom");
    }
}
