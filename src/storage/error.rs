//! Storage layer error types
//!
//! All errors that can occur while loading or saving database sections are
//! defined here. We use `thiserror` for ergonomic error definition.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error (filesystem level)
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// the database directory exists but has no header
    #[error("database header missing: {0}")]
    MissingHeader(PathBuf),

    /// a section file contains a line we do not understand
    #[error("corrupted data at {path}:{line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// a commit record marker is out of sequence
    #[error("bad commit id {found} in {path} (expected {expected})")]
    BadRecordIndex {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    /// the stored header disagrees with what the caller asked for
    #[error("database was created with {field}={stored}, not {supplied}")]
    HeaderMismatch {
        field: &'static str,
        stored: String,
        supplied: String,
    },

    /// a regular file occupies the database directory path
    #[error("file in the way at '{0}'")]
    FileInTheWay(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        StorageError::Corrupt {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    /// check if this error means the on-disk database is damaged
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StorageError::MissingHeader(_)
                | StorageError::Corrupt { .. }
                | StorageError::BadRecordIndex { .. }
        )
    }

    /// check if this error is fixed by changing the invocation
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            StorageError::HeaderMismatch { .. } | StorageError::FileInTheWay(_)
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
