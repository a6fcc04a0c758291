//! Commit graph error types.

use thiserror::Error;

use crate::graph::types::Hash;

/// Errors raised while indexing or linking a commit graph.
///
/// Every variant means the commit records handed to the graph cannot be
/// trusted, so none of them are recoverable within a run.
#[derive(Debug, Error)]
pub enum GraphError {
    /// a commit names a parent that is not part of the record set
    #[error("commit {commit} has parent {parent} which is missing from the commit set")]
    MissingParent { commit: Hash, parent: Hash },

    /// the same hash was supplied twice
    #[error("duplicate commit record: {0}")]
    DuplicateCommit(Hash),
}

/// result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
