//! Base info: the stored signature of the repository.
//!
//! If the object count and the ref list still match the live repository and
//! the last rebuild finished, the stored graph is assumed to be current.

use std::fmt::Write;
use std::path::Path;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv;
use crate::storage::section::{content_lines, Section};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseInfo {
    /// number of objects in the repo
    pub num_repo_objects: u64,
    /// number of commits in the repo
    pub num_repo_commits: u64,
    /// digest of the ref list, see [`crate::sync::refs_signature`]
    pub refs_signature: String,
    /// true once a graph rebuild has run to completion
    pub graph_up_to_date: bool,

    dirty: bool,
}

impl Section for BaseInfo {
    const FILE_NAME: &'static str = ".info";

    fn encode(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "numRepoObjects={}", self.num_repo_objects);
        let _ = writeln!(out, "numRepoCommits={}", self.num_repo_commits);
        let _ = writeln!(out, "refsSignature={}", self.refs_signature);
        let _ = writeln!(out, "graphUpToDate={}", self.graph_up_to_date);
        out
    }

    fn decode(path: &Path, lines: &[String]) -> StorageResult<Self> {
        let mut info = BaseInfo::default();

        for (number, line) in content_lines(lines) {
            if let Some(n) = kv::get_int(line, "numRepoObjects") {
                info.num_repo_objects = n;
            } else if let Some(n) = kv::get_int(line, "numRepoCommits") {
                info.num_repo_commits = n;
            } else if let Some(value) = kv::get_str(line, "refsSignature") {
                info.refs_signature = value.to_string();
            } else if let Some(flag) = kv::get_bool(line, "graphUpToDate") {
                info.graph_up_to_date = flag;
            } else {
                return Err(StorageError::corrupt(path, number, format!("invalid base info: {}", line)));
            }
        }

        Ok(info)
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_info_encoding() {
        let info = BaseInfo {
            num_repo_objects: 1200,
            num_repo_commits: 300,
            refs_signature: "abc".to_string(),
            graph_up_to_date: true,
            dirty: true,
        };

        let text = info.encode();
        assert_eq!(
            text,
            "numRepoObjects=1200\nnumRepoCommits=300\nrefsSignature=abc\ngraphUpToDate=true\n"
        );

        let decoded = BaseInfo::decode(Path::new(".info"), &lines(&text)).unwrap();
        assert_eq!(decoded.num_repo_objects, 1200);
        assert_eq!(decoded.num_repo_commits, 300);
        assert_eq!(decoded.refs_signature, "abc");
        assert!(decoded.graph_up_to_date);
    }

    #[test]
    fn test_info_rejects_bad_values() {
        let bad_bool = lines("graphUpToDate=maybe");
        assert!(BaseInfo::decode(Path::new(".info"), &bad_bool).is_err());

        let bad_int = lines("numRepoObjects=-1");
        assert!(BaseInfo::decode(Path::new(".info"), &bad_int).is_err());
    }

    #[test]
    fn test_missing_info_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let info = BaseInfo::load(dir.path()).unwrap();
        assert_eq!(info, BaseInfo::default());
        assert!(!info.graph_up_to_date);
    }
}
