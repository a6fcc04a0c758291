//! Shared load/save plumbing for database sections.

use std::path::Path;

use crate::storage::error::StorageResult;
use crate::storage::kv;

/// One independently persisted part of the database.
///
/// A section is loaded from a single file in the database directory and
/// rewritten in full when saved. The dirty flag is only cleared once the
/// write has succeeded, so a failed save is retried by the next one.
pub trait Section: Default {
    /// file name inside the database directory
    const FILE_NAME: &'static str;

    /// render the whole section as file contents
    fn encode(&self) -> String;

    /// parse file contents; `path` is only used in error messages
    fn decode(path: &Path, lines: &[String]) -> StorageResult<Self>;

    fn is_dirty(&self) -> bool;

    fn set_dirty(&mut self, dirty: bool);

    /// Load the section, treating a missing file as an empty section.
    fn load(dir: &Path) -> StorageResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        match kv::read_lines(&path)? {
            Some(lines) => Self::decode(&path, &lines),
            None => Ok(Self::default()),
        }
    }

    /// Write the section and clear the dirty flag.
    fn save(&mut self, dir: &Path) -> StorageResult<()> {
        let path = dir.join(Self::FILE_NAME);
        kv::write_file(&path, &self.encode())?;
        self.set_dirty(false);
        Ok(())
    }

    /// Write the section only if it has unsaved changes.
    ///
    /// Returns whether a write happened.
    fn save_if_dirty(&mut self, dir: &Path) -> StorageResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save(dir)?;
        Ok(true)
    }
}

/// Lines worth parsing, paired with their 1-based line numbers.
pub(crate) fn content_lines(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| (i + 1, line.as_str()))
        .filter(|(_, line)| !line.is_empty())
}
