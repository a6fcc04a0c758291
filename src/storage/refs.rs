//! The stored ref list.
//!
//! One ref per line as `<hash> <name>`. Hashes never contain spaces, so the
//! name is everything after the first space.

use std::fmt::Write;
use std::path::Path;

use crate::graph::{Hash, Ref};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::section::{content_lines, Section};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefsSection {
    pub refs: Vec<Ref>,

    dirty: bool,
}

impl RefsSection {
    /// Replace the ref list and mark the section for saving.
    pub fn replace(&mut self, refs: Vec<Ref>) {
        self.refs = refs;
        self.dirty = true;
    }
}

impl Section for RefsSection {
    const FILE_NAME: &'static str = "refs";

    fn encode(&self) -> String {
        let mut out = String::new();
        for r in &self.refs {
            let _ = writeln!(out, "{} {}", r.hash, r.name);
        }
        out
    }

    fn decode(path: &Path, lines: &[String]) -> StorageResult<Self> {
        let mut refs = Vec::with_capacity(lines.len());

        for (number, line) in content_lines(lines) {
            let (hash, name) = line
                .split_once(' ')
                .ok_or_else(|| StorageError::corrupt(path, number, "expected '<hash> <name>'"))?;
            let hash = Hash::parse(hash).map_err(|e| StorageError::corrupt(path, number, e.to_string()))?;
            refs.push(Ref::new(hash, name));
        }

        Ok(Self { refs, dirty: false })
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}
