//! The stored commit graph.
//!
//! File layout:
//!
//! ```text
//! ===== hashes: 3
//! <hash>                 one per line, in the source's log order
//! ===== commits: 3
//! -- 0
//! hash=<hash>
//! timestamp=<seconds>
//! authorName=<name>
//! authorEmail=<email>
//! parents=<hash>, <hash>
//! children=<hash>
//! -- 1
//! ...
//! ```
//!
//! Records are written oldest first (author time, then hash), so saving the
//! same graph twice produces identical bytes whatever order it is held in
//! memory.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt::Write;
use std::path::Path;

use crate::graph::{Commit, CommitGraph, Hash};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv;
use crate::storage::section::{content_lines, Section};

const HASHES_MARKER: &str = "===== hashes: ";
const COMMITS_MARKER: &str = "===== commits: ";
const RECORD_MARKER: &str = "-- ";

#[derive(Debug, Clone, Default)]
pub struct CommitsSection {
    /// every commit hash, in the source's log order
    pub hashes: Vec<Hash>,
    /// the annotated graph
    pub graph: CommitGraph,

    dirty: bool,
}

impl CommitsSection {
    /// Replace the stored graph and mark the section for saving.
    pub fn replace(&mut self, hashes: Vec<Hash>, graph: CommitGraph) {
        self.hashes = hashes;
        self.graph = graph;
        self.dirty = true;
    }

    /// commits in save order: oldest author time first, ties broken by hash
    pub fn ordered_commits(&self) -> Vec<&Commit> {
        let mut heap: BinaryHeap<Reverse<(i64, &Hash)>> = self
            .graph
            .iter()
            .map(|c| Reverse((c.timestamp, &c.hash)))
            .collect();

        let mut ordered = Vec::with_capacity(heap.len());
        while let Some(Reverse((_, hash))) = heap.pop() {
            if let Some(commit) = self.graph.get(hash) {
                ordered.push(commit);
            }
        }
        ordered
    }
}

impl Section for CommitsSection {
    const FILE_NAME: &'static str = "commits";

    fn encode(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}{}", HASHES_MARKER, self.hashes.len());
        for hash in &self.hashes {
            let _ = writeln!(out, "{}", hash);
        }

        let _ = writeln!(out, "{}{}", COMMITS_MARKER, self.graph.len());
        for (i, commit) in self.ordered_commits().into_iter().enumerate() {
            let _ = writeln!(out, "{}{}", RECORD_MARKER, i);
            let _ = writeln!(out, "hash={}", commit.hash);
            let _ = writeln!(out, "timestamp={}", commit.timestamp);
            let _ = writeln!(out, "authorName={}", commit.author_name);
            let _ = writeln!(out, "authorEmail={}", commit.author_email);
            let _ = writeln!(out, "parents={}", kv::join_list(&commit.parents));
            let _ = writeln!(out, "children={}", kv::join_list(&commit.children));
        }

        out
    }

    fn decode(path: &Path, lines: &[String]) -> StorageResult<Self> {
        let mut decoder = Decoder::new(path);
        for (number, line) in content_lines(lines) {
            decoder.line(number, line)?;
        }
        decoder.finish()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Start,
    Hashes,
    Commits,
}

/// A commit record being read; `hash` is required, the rest default.
#[derive(Debug, Default)]
struct PartialCommit {
    line: usize,
    hash: Option<Hash>,
    timestamp: i64,
    author_name: String,
    author_email: String,
    parents: Vec<Hash>,
    children: BTreeSet<Hash>,
}

struct Decoder<'a> {
    path: &'a Path,
    mode: Mode,
    declared_hashes: usize,
    declared_commits: usize,
    hashes: Vec<Hash>,
    commits: Vec<Commit>,
    current: Option<PartialCommit>,
    last_line: usize,
}

impl<'a> Decoder<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            mode: Mode::Start,
            declared_hashes: 0,
            declared_commits: 0,
            hashes: Vec::new(),
            commits: Vec::new(),
            current: None,
            last_line: 0,
        }
    }

    fn corrupt(&self, line: usize, reason: impl Into<String>) -> StorageError {
        StorageError::corrupt(self.path, line, reason)
    }

    fn parse_count(&self, number: usize, text: &str) -> StorageResult<usize> {
        text.parse()
            .map_err(|_| self.corrupt(number, format!("bad count '{}'", text)))
    }

    fn parse_hash(&self, number: usize, text: &str) -> StorageResult<Hash> {
        Hash::parse(text).map_err(|e| self.corrupt(number, e.to_string()))
    }

    fn parse_hash_list(&self, number: usize, text: &str) -> StorageResult<Vec<Hash>> {
        kv::split_list(text)
            .into_iter()
            .map(|h| self.parse_hash(number, h))
            .collect()
    }

    fn line(&mut self, number: usize, line: &str) -> StorageResult<()> {
        self.last_line = number;

        if let Some(count) = line.strip_prefix(HASHES_MARKER) {
            if self.mode != Mode::Start {
                return Err(self.corrupt(number, "unexpected hash list marker"));
            }
            self.declared_hashes = self.parse_count(number, count)?;
            self.mode = Mode::Hashes;
            return Ok(());
        }

        if let Some(count) = line.strip_prefix(COMMITS_MARKER) {
            if self.mode != Mode::Hashes {
                return Err(self.corrupt(number, "unexpected commit list marker"));
            }
            self.declared_commits = self.parse_count(number, count)?;
            self.mode = Mode::Commits;
            return Ok(());
        }

        match self.mode {
            Mode::Start => Err(self.corrupt(number, "data before section marker")),
            Mode::Hashes => {
                let hash = self.parse_hash(number, line)?;
                self.hashes.push(hash);
                Ok(())
            }
            Mode::Commits => self.commit_line(number, line),
        }
    }

    fn commit_line(&mut self, number: usize, line: &str) -> StorageResult<()> {
        if let Some(index) = line.strip_prefix(RECORD_MARKER) {
            let found = self.parse_count(number, index)?;
            self.close_record()?;
            let expected = self.commits.len();
            if found != expected {
                return Err(StorageError::BadRecordIndex {
                    path: self.path.to_path_buf(),
                    found,
                    expected,
                });
            }
            self.current = Some(PartialCommit {
                line: number,
                ..Default::default()
            });
            return Ok(());
        }

        if self.current.is_none() {
            return Err(self.corrupt(number, "commit field before record marker"));
        }

        if let Some(value) = kv::get_str(line, "hash") {
            let hash = self.parse_hash(number, value)?;
            self.record().hash = Some(hash);
        } else if let Some(value) = kv::get_int(line, "timestamp") {
            self.record().timestamp = value;
        } else if let Some(value) = kv::get_str(line, "authorName") {
            self.record().author_name = value.to_string();
        } else if let Some(value) = kv::get_str(line, "authorEmail") {
            self.record().author_email = value.to_string();
        } else if let Some(value) = kv::get_str(line, "parents") {
            let parents = self.parse_hash_list(number, value)?;
            self.record().parents = parents;
        } else if let Some(value) = kv::get_str(line, "children") {
            let children = self.parse_hash_list(number, value)?;
            self.record().children = children.into_iter().collect();
        } else {
            return Err(self.corrupt(number, format!("bad commit {}: {}", self.commits.len(), line)));
        }

        Ok(())
    }

    fn record(&mut self) -> &mut PartialCommit {
        self.current.get_or_insert_with(PartialCommit::default)
    }

    fn close_record(&mut self) -> StorageResult<()> {
        let Some(partial) = self.current.take() else {
            return Ok(());
        };

        let hash = partial
            .hash
            .ok_or_else(|| self.corrupt(partial.line, "commit record has no hash"))?;

        self.commits.push(Commit {
            hash,
            timestamp: partial.timestamp,
            author_name: partial.author_name,
            author_email: partial.author_email,
            parents: partial.parents,
            children: partial.children,
        });
        Ok(())
    }

    fn finish(mut self) -> StorageResult<CommitsSection> {
        self.close_record()?;
        let end = self.last_line;

        if self.hashes.len() != self.declared_hashes {
            return Err(self.corrupt(
                end,
                format!("expected {} hashes, found {}", self.declared_hashes, self.hashes.len()),
            ));
        }
        if self.commits.len() != self.declared_commits {
            return Err(self.corrupt(
                end,
                format!("expected {} commits, found {}", self.declared_commits, self.commits.len()),
            ));
        }

        let graph = CommitGraph::from_commits(self.commits).map_err(|e| StorageError::corrupt(self.path, end, e.to_string()))?;

        Ok(CommitsSection {
            hashes: self.hashes,
            graph,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommitRecord, GraphBuilder, Ref};

    fn h(n: u32) -> Hash {
        Hash::parse(&format!("{:040x}", n)).unwrap()
    }

    fn record(n: u32, timestamp: i64, parents: &[u32]) -> CommitRecord {
        CommitRecord {
            hash: h(n),
            timestamp,
            author_name: format!("Author {}", n),
            author_email: format!("a{}@example.com", n),
            parents: parents.iter().map(|&p| h(p)).collect(),
        }
    }

    fn sample_section(records: Vec<CommitRecord>) -> CommitsSection {
        let hashes = records.iter().map(|r| r.hash.clone()).collect();
        let refs = vec![Ref::new(records[0].hash.clone(), "refs/heads/main")];
        let built = GraphBuilder::build(records, &refs).unwrap();

        let mut section = CommitsSection::default();
        section.replace(hashes, built.graph);
        section
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_commits_encoding() {
        let section = sample_section(vec![record(2, 20, &[1]), record(1, 10, &[])]);
        let text = section.encode();

        let expected = format!(
            "===== hashes: 2\n{b}\n{a}\n===== commits: 2\n\
             -- 0\nhash={a}\ntimestamp=10\nauthorName=Author 1\nauthorEmail=a1@example.com\nparents=\nchildren={b}\n\
             -- 1\nhash={b}\ntimestamp=20\nauthorName=Author 2\nauthorEmail=a2@example.com\nparents={a}\nchildren=\n",
            a = h(1),
            b = h(2)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        // same timestamps force the hash tie-break
        let section = sample_section(vec![
            record(4, 30, &[2, 3]),
            record(3, 20, &[1]),
            record(2, 20, &[1]),
            record(1, 10, &[]),
        ]);

        let first = section.encode();
        let loaded = CommitsSection::decode(Path::new("commits"), &lines(&first)).unwrap();
        let second = loaded.encode();

        assert_eq!(first, second);
        assert_eq!(loaded.hashes, section.hashes);
        assert_eq!(
            loaded.graph.get(&h(1)).unwrap().children,
            [h(2), h(3)].into_iter().collect::<BTreeSet<_>>()
        );
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_save_load_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut section = sample_section(vec![record(2, 20, &[1]), record(1, 10, &[])]);

        section.save(dir.path()).unwrap();
        let first = std::fs::read(dir.path().join("commits")).unwrap();

        let mut loaded = CommitsSection::load(dir.path()).unwrap();
        loaded.save(dir.path()).unwrap();
        let second = std::fs::read(dir.path().join("commits")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_record_index_out_of_sequence() {
        let text = format!(
            "===== hashes: 0\n===== commits: 2\n-- 0\nhash={}\n-- 2\nhash={}\n",
            h(1),
            h(2)
        );

        let err = CommitsSection::decode(Path::new("commits"), &lines(&text)).unwrap_err();
        assert!(matches!(err, StorageError::BadRecordIndex { found: 2, expected: 1, .. }));
    }

    #[test]
    fn test_unknown_commit_field() {
        let text = format!("===== hashes: 0\n===== commits: 1\n-- 0\nhash={}\nsubject=hello\n", h(1));
        let err = CommitsSection::decode(Path::new("commits"), &lines(&text)).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 5, .. }));
    }

    #[test]
    fn test_truncated_file() {
        let section = sample_section(vec![record(2, 20, &[1]), record(1, 10, &[])]);
        let text = section.encode();
        let mut truncated = lines(&text);
        truncated.truncate(truncated.len() - 7);

        let err = CommitsSection::decode(Path::new("commits"), &truncated).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_missing_parent_on_load() {
        let text = format!(
            "===== hashes: 0\n===== commits: 1\n-- 0\nhash={}\nparents={}\n",
            h(2),
            h(1)
        );
        assert!(CommitsSection::decode(Path::new("commits"), &lines(&text)).is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let section = CommitsSection::load(dir.path()).unwrap();
        assert!(section.graph.is_empty());
        assert!(section.hashes.is_empty());
    }
}
