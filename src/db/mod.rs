//! High-level database API.
//!
//! Ties a storage directory to the repository recorded in its header and
//! runs synchronization against it.

mod api;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult, VcsKind};
