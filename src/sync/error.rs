use thiserror::Error;

use crate::graph::GraphError;
use crate::source::SourceError;
use crate::storage::StorageError;

/// Errors that abort a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("repository query failed: {0}")]
    Source(#[from] SourceError),

    #[error("inconsistent commit log: {0}")]
    Graph(#[from] GraphError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// check if the repository returned data that cannot be trusted
    pub fn is_inconsistent_data(&self) -> bool {
        match self {
            SyncError::Graph(_) => true,
            SyncError::Source(e) => e.is_inconsistent_data(),
            SyncError::Storage(_) => false,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
