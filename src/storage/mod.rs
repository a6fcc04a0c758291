//! storage layer for vcsloc
//!
//! The database is a directory of small text files, one per section. Each
//! section is loaded and saved on its own and carries a dirty flag, so a
//! save only rewrites what changed.
//!
//!  # Layout
//!
//! ```text
//!  <db>/
//!  ├── .header    repoPath, vcs              (written once, checked on reopen)
//!  ├── .info      object/commit counts, ref signature, graphUpToDate
//!  ├── refs       <hash> <name> per line
//!  └── commits    hash list + one record per commit
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vcsloc::storage::VcsDatabase;
//!
//! let mut db = if VcsDatabase::probe(path)? {
//!     VcsDatabase::open(path)?
//! } else {
//!     VcsDatabase::create(path, "/src/repo", "git")?
//! };
//! db.load()?;
//!
//! db.refs.replace(live_refs);
//! db.save()?;
//! ```

mod commits;
mod database;
mod error;
mod header;
mod info;
mod kv;
mod refs;
mod section;

// Re-export public API
pub use commits::CommitsSection;
pub use database::VcsDatabase;
pub use error::{StorageError, StorageResult};
pub use header::Header;
pub use info::BaseInfo;
pub use refs::RefsSection;
pub use section::Section;
