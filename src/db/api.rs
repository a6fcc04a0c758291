//! Database API - high-level interface for vcsloc.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use crate::source::{GitCliSource, LibGitSource, RepoSource, SourceError};
use crate::storage::{StorageError, VcsDatabase};
use crate::sync::{SyncError, SyncReport, Synchronizer};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("no database path given")]
    MissingDbPath,

    #[error("a repository path is required to create a new database")]
    MissingRepoPath,

    #[error("a vcs name is required to create a new database")]
    MissingVcs,

    #[error("unknown vcs '{0}' (expected 'git' or 'git-cli')")]
    UnknownVcs(String),
}

impl DatabaseError {
    /// check if this error is fixed by changing the invocation
    pub fn is_config(&self) -> bool {
        match self {
            DatabaseError::MissingDbPath
            | DatabaseError::MissingRepoPath
            | DatabaseError::MissingVcs
            | DatabaseError::UnknownVcs(_) => true,
            DatabaseError::Storage(e) => e.is_config(),
            DatabaseError::Source(SourceError::NotARepository(_) | SourceError::NotInstalled(_)) => true,
            _ => false,
        }
    }
}

/// Which backend reads the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    /// libgit2, in-process
    Git,
    /// the `git` executable
    GitCli,
}

impl VcsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::GitCli => "git-cli",
        }
    }

    /// Open a source of this kind for the repository at `repo_path`.
    pub fn open_source(&self, repo_path: &Path) -> Result<Box<dyn RepoSource>, SourceError> {
        Ok(match self {
            VcsKind::Git => Box::new(LibGitSource::open(repo_path)?),
            VcsKind::GitCli => Box::new(GitCliSource::new(repo_path)?),
        })
    }
}

impl FromStr for VcsKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(VcsKind::Git),
            "git-cli" => Ok(VcsKind::GitCli),
            other => Err(DatabaseError::UnknownVcs(other.to_string())),
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database configuration options.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Path to the database directory.
    pub path: PathBuf,
    /// Repository to analyze; required when the database is created.
    pub repo_path: Option<PathBuf>,
    /// Backend; required when the database is created.
    pub vcs: Option<VcsKind>,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl DatabaseConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the repository path.
    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    /// Set the backend.
    pub fn vcs(mut self, vcs: VcsKind) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }
}

/// The main database handle.
pub struct Database {
    config: DatabaseConfig,
    store: VcsDatabase,
    vcs: VcsKind,
}

impl Database {
    /// Open an existing database at the given path.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref()))
    }

    /// Open or create a database with custom configuration.
    ///
    /// An existing database is checked against any repository path or vcs
    /// given in `config`. A new one needs both.
    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        if config.path.as_os_str().is_empty() {
            return Err(DatabaseError::MissingDbPath);
        }

        let repo_path = config.repo_path.as_ref().map(|p| p.to_string_lossy().into_owned());
        let vcs_name = config.vcs.map(|v| v.as_str());

        let mut store = if VcsDatabase::probe(&config.path)? {
            let store = VcsDatabase::open(&config.path)?;
            store.header.validate(repo_path.as_deref(), vcs_name)?;
            store
        } else {
            let repo_path = repo_path.ok_or(DatabaseError::MissingRepoPath)?;
            let vcs_name = vcs_name.ok_or(DatabaseError::MissingVcs)?;
            info!(path = %config.path.display(), repo = %repo_path, vcs = vcs_name, "creating database");
            VcsDatabase::create(&config.path, &repo_path, vcs_name)?
        };

        let vcs: VcsKind = store.header.vcs.parse()?;
        store.load()?;

        Ok(Self { config, store, vcs })
    }

    /// Synchronize with the repository recorded in the header.
    pub fn analyze(&mut self) -> DatabaseResult<SyncReport> {
        let repo_path = PathBuf::from(&self.store.header.repo_path);
        debug!(repo = %repo_path.display(), vcs = %self.vcs, "opening repository");

        let source = self.vcs.open_source(&repo_path)?;
        self.analyze_with(source.as_ref())
    }

    /// Synchronize with an explicit source.
    pub fn analyze_with(&mut self, source: &dyn RepoSource) -> DatabaseResult<SyncReport> {
        let report = Synchronizer::new(source).run(&mut self.store)?;

        if self.config.verbose {
            for tip in &report.tips {
                info!(hash = %tip.hash.short(), name = %tip.name, "tip");
            }
            for root in &report.roots {
                info!(hash = %root.short(), "root");
            }
        }

        Ok(report)
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn vcs(&self) -> VcsKind {
        self.vcs
    }

    /// Get the loaded database sections.
    pub fn store(&self) -> &VcsDatabase {
        &self.store
    }
}
