//! The on-disk database: a directory holding one file per section.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::commits::CommitsSection;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::header::Header;
use crate::storage::info::BaseInfo;
use crate::storage::refs::RefsSection;
use crate::storage::section::Section;

/// In-memory copy of every section plus the directory it came from.
///
/// Sections are written back lazily: mutate them, mark them dirty, then
/// call [`VcsDatabase::save`].
#[derive(Debug)]
pub struct VcsDatabase {
    path: PathBuf,
    pub header: Header,
    pub info: BaseInfo,
    pub refs: RefsSection,
    pub commits: CommitsSection,
}

impl VcsDatabase {
    /// Check whether a database directory exists at `path`.
    ///
    /// A regular file at that path is an error rather than `false`.
    pub fn probe(path: &Path) -> StorageResult<bool> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(true),
            Ok(_) => Err(StorageError::FileInTheWay(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Create a new database directory and write its header.
    ///
    /// The other sections start empty and are not written until they change.
    pub fn create(path: impl AsRef<Path>, repo_path: &str, vcs: &str) -> StorageResult<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| StorageError::io(path, e))?;

        let mut db = Self {
            path: path.to_path_buf(),
            header: Header::new(repo_path, vcs),
            info: BaseInfo::default(),
            refs: RefsSection::default(),
            commits: CommitsSection::default(),
        };
        db.header.save(&db.path)?;

        debug!(path = %path.display(), repo = repo_path, vcs, "created database");
        Ok(db)
    }

    /// Open an existing database, reading only the header.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if !path.join(Header::FILE_NAME).is_file() {
            return Err(StorageError::MissingHeader(path.to_path_buf()));
        }

        let header = Header::load(path)?;
        debug!(path = %path.display(), repo = %header.repo_path, vcs = %header.vcs, "opened database");

        Ok(Self {
            path: path.to_path_buf(),
            header,
            info: BaseInfo::default(),
            refs: RefsSection::default(),
            commits: CommitsSection::default(),
        })
    }

    /// Get the database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load base info, refs and commits; missing files load as empty.
    pub fn load(&mut self) -> StorageResult<()> {
        self.info = BaseInfo::load(&self.path)?;
        self.refs = RefsSection::load(&self.path)?;
        self.commits = CommitsSection::load(&self.path)?;

        debug!(
            refs = self.refs.refs.len(),
            commits = self.commits.graph.len(),
            up_to_date = self.info.graph_up_to_date,
            "loaded database"
        );
        Ok(())
    }

    /// Write every dirty section, in order header, info, refs, commits.
    ///
    /// Stops at the first failure; that section and the ones after it keep
    /// their dirty flags. Returns the number of files written.
    pub fn save(&mut self) -> StorageResult<usize> {
        let mut written = 0;
        written += usize::from(self.header.save_if_dirty(&self.path)?);
        written += usize::from(self.info.save_if_dirty(&self.path)?);
        written += usize::from(self.refs.save_if_dirty(&self.path)?);
        written += usize::from(self.commits.save_if_dirty(&self.path)?);

        debug!(written, "saved database");
        Ok(written)
    }

    /// Flag the stored graph as stale and persist that immediately.
    ///
    /// Refs and commits are marked dirty as well, so they are rewritten
    /// once the rebuild completes.
    pub fn mark_stale(&mut self) -> StorageResult<()> {
        self.info.graph_up_to_date = false;
        self.info.set_dirty(true);
        self.refs.set_dirty(true);
        self.commits.set_dirty(true);
        self.info.save(&self.path)
    }

    pub fn is_dirty(&self) -> bool {
        self.header.is_dirty() || self.info.is_dirty() || self.refs.is_dirty() || self.commits.is_dirty()
    }
}
