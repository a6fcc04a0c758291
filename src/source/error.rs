//! Repository source error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::graph::InvalidHashError;

/// Errors raised while querying a repository.
#[derive(Debug, Error)]
pub enum SourceError {
    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O error talking to a subprocess
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// the path does not hold a repository
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    /// a required executable is not on PATH
    #[error("not installed: {0}")]
    NotInstalled(String),

    /// a subprocess exited unsuccessfully
    #[error("`{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// a log line is missing an expected delimiter or field
    #[error("bad log line ({reason}): {line}")]
    MalformedLog { line: String, reason: String },

    /// command output contained something that is not a hash
    #[error("invalid hash '{text}': {source}")]
    InvalidHash {
        text: String,
        #[source]
        source: InvalidHashError,
    },
}

impl SourceError {
    /// check if this error means the fetched data cannot be trusted
    pub fn is_inconsistent_data(&self) -> bool {
        matches!(
            self,
            SourceError::MalformedLog { .. } | SourceError::InvalidHash { .. }
        )
    }
}

/// result type alias for repository queries
pub type SourceResult<T> = Result<T, SourceError>;
