//! Repository data sources.
//!
//! The sync engine never talks to a version-control system directly; it
//! asks a [`RepoSource`] for the handful of read-only facts it needs. Two
//! Git backends are provided:
//!
//! - [`LibGitSource`] reads the repository in-process through libgit2.
//! - [`GitCliSource`] runs the `git` executable and parses its output.

mod cli;
mod error;
mod libgit;
mod log;

pub use cli::GitCliSource;
pub use error::{SourceError, SourceResult};
pub use libgit::LibGitSource;
pub use log::{parse_count_objects, parse_log_line, parse_ref_list, LOG_FORMAT, REF_FORMAT};

#[cfg(test)]
pub(crate) use libgit::fixtures;

use crate::graph::{CommitRecord, Hash, Ref};

/// Read-only queries a version-control backend must answer.
pub trait RepoSource {
    /// total number of objects, used only as a cheap change signal
    fn object_count(&self) -> SourceResult<u64>;

    /// all refs, tags peeled to their commits, one entry per ref name
    fn list_refs(&self) -> SourceResult<Vec<Ref>>;

    /// commits with no parents
    fn root_commits(&self) -> SourceResult<Vec<Hash>>;

    /// every commit hash reachable from any ref, in the backend's log order
    fn all_commit_hashes(&self) -> SourceResult<Vec<Hash>>;

    /// full metadata for every commit reachable from any ref
    fn commit_log(&self) -> SourceResult<Vec<CommitRecord>>;
}

/// Collapse refs sharing a name to the last-seen hash, keeping the position
/// of the first occurrence.
pub(crate) fn collapse_duplicate_refs(refs: Vec<Ref>) -> Vec<Ref> {
    let mut positions = std::collections::HashMap::new();
    let mut collapsed: Vec<Ref> = Vec::with_capacity(refs.len());

    for r in refs {
        match positions.get(&r.name) {
            Some(&pos) => collapsed[pos] = r,
            None => {
                positions.insert(r.name.clone(), collapsed.len());
                collapsed.push(r);
            }
        }
    }

    collapsed
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory source for exercising the builder and sync engine.

    use std::cell::Cell;

    use super::*;

    /// A fixed repository snapshot that counts how often the log is fetched.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        pub objects: u64,
        pub refs: Vec<Ref>,
        pub records: Vec<CommitRecord>,
        pub log_fetches: Cell<usize>,
    }

    impl MemorySource {
        pub fn new(objects: u64, refs: Vec<Ref>, records: Vec<CommitRecord>) -> Self {
            Self {
                objects,
                refs,
                records,
                log_fetches: Cell::new(0),
            }
        }
    }

    impl RepoSource for MemorySource {
        fn object_count(&self) -> SourceResult<u64> {
            Ok(self.objects)
        }

        fn list_refs(&self) -> SourceResult<Vec<Ref>> {
            Ok(self.refs.clone())
        }

        fn root_commits(&self) -> SourceResult<Vec<Hash>> {
            Ok(self
                .records
                .iter()
                .filter(|r| r.parents.is_empty())
                .map(|r| r.hash.clone())
                .collect())
        }

        fn all_commit_hashes(&self) -> SourceResult<Vec<Hash>> {
            Ok(self.records.iter().map(|r| r.hash.clone()).collect())
        }

        fn commit_log(&self) -> SourceResult<Vec<CommitRecord>> {
            self.log_fetches.set(self.log_fetches.get() + 1);
            Ok(self.records.clone())
        }
    }
}
