//! Commit graph model and child-edge derivation.
//!
//! Commit records arrive from a repository source with parent edges only.
//! [`CommitGraph`] indexes them into an arena addressed by position, checks
//! that every parent is present, and derives the reverse (child) edges by
//! walking first-parent chains from every ref. [`GraphBuilder`] wraps that
//! walk with ref bookkeeping: dangling refs, tips, roots and unreachable
//! commits.
//!
//! ```text
//!   records ──► CommitGraph::from_records ──► derive_children ──► BuiltGraph
//!                 (index + closure check)      (BFS over refs)     (tips, roots)
//! ```

mod builder;
mod error;
mod types;

pub use builder::{BuiltGraph, CommitGraph, GraphBuilder, Traversal};
pub use error::{GraphError, GraphResult};
pub use types::{Commit, CommitRecord, Hash, InvalidHashError, Ref};
