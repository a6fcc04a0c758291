//! core types for the commit graph: hashes, refs and commit records.

use std::collections::BTreeSet;
use std::fmt;

use git2::Oid;
use serde::Serialize;

/// A commit identifier in its hex text form.
///
/// Hashes are opaque: equality is byte-exact and the ordering only exists so
/// that hashes can be sorted and joined deterministically.
///
/// Valid hashes:
/// - 40 (SHA-1) or 64 (SHA-256) characters
/// - lowercase hex digits only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Hash(String);

impl Hash {
    /// length of a SHA-1 object name
    pub const SHA1_LEN: usize = 40;

    /// length of a SHA-256 object name
    pub const SHA256_LEN: usize = 64;

    /// parse a hash from its hex text, validating the input
    pub fn parse(text: &str) -> Result<Self, InvalidHashError> {
        Self::validate(text)?;
        Ok(Self(text.to_string()))
    }

    fn validate(text: &str) -> Result<(), InvalidHashError> {
        if text.is_empty() {
            return Err(InvalidHashError::Empty);
        }

        if text.len() != Self::SHA1_LEN && text.len() != Self::SHA256_LEN {
            return Err(InvalidHashError::BadLength(text.len()));
        }

        for (i, c) in text.chars().enumerate() {
            if !matches!(c, '0'..='9' | 'a'..='f') {
                return Err(InvalidHashError::InvalidCharacter { char: c, position: i });
            }
        }

        Ok(())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// abbreviated form used in progress output
    pub fn short(&self) -> &str {
        &self.0[..10]
    }
}

impl From<Oid> for Hash {
    fn from(oid: Oid) -> Self {
        Self(oid.to_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// error type for text that is not a commit hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidHashError {
    Empty,
    BadLength(usize),
    InvalidCharacter { char: char, position: usize },
}

impl fmt::Display for InvalidHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "hash cannot be empty"),
            Self::BadLength(len) => write!(f, "hash has {} characters, expected 40 or 64", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid hash character '{}' at position {}", char, position)
            }
        }
    }
}

impl std::error::Error for InvalidHashError {}

/// A named pointer (branch, tag, remote branch) to a commit.
///
/// Tags are stored already peeled to the commit they point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ref {
    pub hash: Hash,
    pub name: String,
}

impl Ref {
    /// create a new Ref
    pub fn new(hash: Hash, name: impl Into<String>) -> Self {
        Self {
            hash,
            name: name.into(),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hash, self.name)
    }
}

/// A raw commit as fetched from the repository: parent edges only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: Hash,
    /// author time, seconds since the epoch
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    /// ordered; the first parent is the primary line of history
    pub parents: Vec<Hash>,
}

/// A commit in the annotated graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: Hash,
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    pub parents: Vec<Hash>,
    /// computed by the graph builder, empty until then
    pub children: BTreeSet<Hash>,
}

impl Commit {
    /// check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// check if this is a merge commit (has multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

impl From<CommitRecord> for Commit {
    fn from(record: CommitRecord) -> Self {
        Self {
            hash: record.hash,
            timestamp: record.timestamp,
            author_name: record.author_name,
            author_email: record.author_email,
            parents: record.parents,
            children: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_valid() {
        assert!(Hash::parse(&"a".repeat(40)).is_ok());
        assert!(Hash::parse(&"0123456789abcdef".repeat(4)).is_ok());
        assert!(Hash::parse("da39a3ee5e6b4b0d3255bfef95601890afd80709").is_ok());
    }

    #[test]
    fn test_hash_invalid() {
        assert_eq!(Hash::parse(""), Err(InvalidHashError::Empty));
        assert_eq!(Hash::parse("abc123"), Err(InvalidHashError::BadLength(6)));
        assert!(matches!(
            Hash::parse(&"A".repeat(40)),
            Err(InvalidHashError::InvalidCharacter { char: 'A', position: 0 })
        ));
        assert!(Hash::parse(&format!("{}g", "0".repeat(39))).is_err());
    }

    #[test]
    fn test_hash_from_oid() {
        let oid = Oid::from_str("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        let hash = Hash::from(oid);
        assert_eq!(hash.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(hash.short(), "da39a3ee5e");
    }

    #[test]
    fn test_commit_from_record() {
        let parent = Hash::parse(&"1".repeat(40)).unwrap();
        let record = CommitRecord {
            hash: Hash::parse(&"2".repeat(40)).unwrap(),
            timestamp: 42,
            author_name: "Ann".to_string(),
            author_email: "ann@example.com".to_string(),
            parents: vec![parent.clone()],
        };

        let commit = Commit::from(record);
        assert!(commit.children.is_empty());
        assert!(!commit.is_root());
        assert!(!commit.is_merge());
        assert_eq!(commit.parents, vec![parent]);
    }

    #[test]
    fn test_ref_serializes_hash_as_text() {
        let r = Ref::new(Hash::parse(&"ab".repeat(20)).unwrap(), "refs/heads/main");
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["hash"], serde_json::json!("ab".repeat(20)));
        assert_eq!(json["name"], "refs/heads/main");
    }
}
