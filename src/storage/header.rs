//! The database header: which repository this database describes.

use std::fmt::Write;
use std::path::Path;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv;
use crate::storage::section::{content_lines, Section};

/// Written once when the database is created and checked on every reopen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// path to the repository being analyzed
    pub repo_path: String,
    /// version control backend name, e.g. "git"
    pub vcs: String,

    dirty: bool,
}

impl Header {
    pub fn new(repo_path: impl Into<String>, vcs: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            vcs: vcs.into(),
            dirty: true,
        }
    }

    /// Check caller-supplied values against the stored ones.
    ///
    /// `None` means the caller did not specify that field.
    pub fn validate(&self, repo_path: Option<&str>, vcs: Option<&str>) -> StorageResult<()> {
        if let Some(supplied) = repo_path {
            if supplied != self.repo_path {
                return Err(StorageError::HeaderMismatch {
                    field: "repoPath",
                    stored: self.repo_path.clone(),
                    supplied: supplied.to_string(),
                });
            }
        }

        if let Some(supplied) = vcs {
            if supplied != self.vcs {
                return Err(StorageError::HeaderMismatch {
                    field: "vcs",
                    stored: self.vcs.clone(),
                    supplied: supplied.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Section for Header {
    const FILE_NAME: &'static str = ".header";

    fn encode(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "repoPath={}", self.repo_path);
        let _ = writeln!(out, "vcs={}", self.vcs);
        out
    }

    fn decode(path: &Path, lines: &[String]) -> StorageResult<Self> {
        let mut header = Header::default();

        for (number, line) in content_lines(lines) {
            if let Some(value) = kv::get_str(line, "repoPath") {
                header.repo_path = value.to_string();
            } else if let Some(value) = kv::get_str(line, "vcs") {
                header.vcs = value.to_string();
            } else {
                return Err(StorageError::corrupt(path, number, format!("invalid data in header: {}", line)));
            }
        }

        Ok(header)
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

    #[test]
    fn test_header_encoding() {
        let header = Header::new("/src/repo", "git");
        assert_eq!(header.encode(), "repoPath=/src/repo\nvcs=git\n");

        let lines: Vec<String> = header.encode().lines().map(String::from).collect();
        let decoded = Header::decode(Path::new(".header"), &lines).unwrap();
        assert_eq!(decoded.repo_path, "/src/repo");
        assert_eq!(decoded.vcs, "git");
        assert!(!decoded.is_dirty());
    }

    #[test]
    fn test_header_rejects_unknown_key() {
        let lines = vec!["repoPath=/src/repo".to_string(), "colour=blue".to_string()];
        let err = Header::decode(Path::new(".header"), &lines).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_header_validate() {
        let header = Header::new("/src/repo", "git");
        assert!(header.validate(None, None).is_ok());
        assert!(header.validate(Some("/src/repo"), Some("git")).is_ok());

        let err = header.validate(Some("/elsewhere"), None).unwrap_err();
        assert!(matches!(err, StorageError::HeaderMismatch { field: "repoPath", .. }));

        let err = header.validate(None, Some("hg")).unwrap_err();
        assert!(matches!(err, StorageError::HeaderMismatch { field: "vcs", .. }));
    }
}
