//! vcsloc - a persistent commit graph for version-control repositories
//!
//! This crate keeps a local, incrementally refreshed copy of a repository's
//! commit graph (parents, children, roots, tips and authorship) so that
//! later analysis does not have to re-query the repository on every run.
//! The copy lives in a directory of plain text files and is only rebuilt
//! when the repository's object count or ref list changes.
//!
//! # Example
//!
//! ```no_run
//! use vcsloc::db::{Database, DatabaseConfig, VcsKind};
//!
//! let config = DatabaseConfig::new("./repo.vcsloc")
//!     .repo_path("./repo")
//!     .vcs(VcsKind::Git);
//!
//! let mut db = Database::open_with_config(config).unwrap();
//! let report = db.analyze().unwrap();
//! println!("{}", report);
//! ```

pub mod db;
pub mod graph;
pub mod source;
pub mod storage;
pub mod sync;
