//! Cache key derivation (spec.md §4.2): a SHA-256 digest over the
//! repository identity, the searcher's name and version, and the
//! normalized sub-query it was given — never the whole request's query,
//! so two searchers sharing a repository and overlapping criteria can
//! reuse each other's unrelated cache entries.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn compute(
        repo_root: &str,
        head_hex: &str,
        searcher_name: &str,
        searcher_version: u32,
        normalized_sub_query: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(repo_root.as_bytes());
        hasher.update(b"\0");
        hasher.update(head_hex.as_bytes());
        hasher.update(b"\0");
        hasher.update(searcher_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(searcher_version.to_le_bytes());
        hasher.update(b"\0");
        hasher.update(normalized_sub_query.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_fingerprint() {
        let a = Fingerprint::compute("/repo", "abc123", "content", 1, "content=false:foo");
        let b = Fingerprint::compute("/repo", "abc123", "content", 1, "content=false:foo");
        assert_eq!(a, b);
    }

    #[test]
    fn different_head_changes_fingerprint() {
        let a = Fingerprint::compute("/repo", "abc123", "content", 1, "content=false:foo");
        let b = Fingerprint::compute("/repo", "def456", "content", 1, "content=false:foo");
        assert_ne!(a, b);
    }
}
