//! Repository source backed by libgit2.

use std::path::{Path, PathBuf};

use git2::{ReferenceType, Repository, Revwalk, Sort};
use tracing::debug;

use crate::graph::{CommitRecord, Hash, Ref};
use crate::source::error::{SourceError, SourceResult};
use crate::source::{collapse_duplicate_refs, RepoSource};

/// Reads a Git repository in-process.
pub struct LibGitSource {
    repo: Repository,
    path: PathBuf,
}

impl LibGitSource {
    /// Open the repository at `path`.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| SourceError::NotARepository(path.to_path_buf()))?;

        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Get the repository path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// walk every commit reachable from any ref (and HEAD), newest first
    fn walk_all(&self) -> SourceResult<Revwalk<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_glob("*")?;

        // a detached HEAD is part of `log --all`; an unborn one is not an error
        if let Ok(head) = self.repo.head() {
            if let Some(oid) = head.target() {
                if self.repo.find_commit(oid).is_ok() {
                    revwalk.push(oid)?;
                }
            }
        }

        Ok(revwalk)
    }
}

impl RepoSource for LibGitSource {
    fn object_count(&self) -> SourceResult<u64> {
        let odb = self.repo.odb()?;
        let mut count = 0u64;
        odb.foreach(|_| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    fn list_refs(&self) -> SourceResult<Vec<Ref>> {
        let mut refs = Vec::new();

        for reference in self.repo.references()? {
            let reference = reference?;
            if reference.kind() == Some(ReferenceType::Symbolic) {
                continue;
            }
            let Some(name) = reference.name() else {
                debug!("skipping ref with non-utf8 name");
                continue;
            };

            // tags are stored pointing at the commit they name
            let commit = match reference.peel_to_commit() {
                Ok(commit) => commit,
                Err(e) => {
                    debug!(name, error = %e, "skipping ref that does not point at a commit");
                    continue;
                }
            };

            refs.push(Ref::new(Hash::from(commit.id()), name));
        }

        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collapse_duplicate_refs(refs))
    }

    fn root_commits(&self) -> SourceResult<Vec<Hash>> {
        let mut roots = Vec::new();
        for oid in self.walk_all()? {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() == 0 {
                roots.push(Hash::from(commit.id()));
            }
        }
        Ok(roots)
    }

    fn all_commit_hashes(&self) -> SourceResult<Vec<Hash>> {
        self.walk_all()?
            .map(|oid| oid.map(Hash::from).map_err(SourceError::from))
            .collect()
    }

    fn commit_log(&self) -> SourceResult<Vec<CommitRecord>> {
        let mut records = Vec::new();

        for oid in self.walk_all()? {
            let commit = self.repo.find_commit(oid?)?;
            let author = commit.author();

            records.push(CommitRecord {
                hash: Hash::from(commit.id()),
                timestamp: author.when().seconds(),
                author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
                author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
                parents: commit.parent_ids().map(Hash::from).collect(),
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small repositories built with git2 for tests.

    use git2::{ObjectType, Oid, Repository, Signature, Time};

    fn empty_tree(repo: &Repository) -> Oid {
        repo.treebuilder(None).unwrap().write().unwrap()
    }

    /// Commit an empty tree with the given parents and author time.
    pub fn commit(repo: &Repository, update_ref: Option<&str>, parents: &[Oid], time: i64, message: &str) -> Oid {
        let tree = repo.find_tree(empty_tree(repo)).unwrap();
        let sig = Signature::new("Test", "test@test.com", &Time::new(time, 0)).unwrap();
        let parents: Vec<git2::Commit<'_>> = parents.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        repo.commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// Write a root commit object by hand so the author bytes need not be UTF-8.
    pub fn raw_commit(repo: &Repository, update_ref: &str, author: &[u8], time: i64) -> Oid {
        let mut body = format!("tree {}\n", empty_tree(repo)).into_bytes();
        for header in [&b"author "[..], &b"committer "[..]] {
            body.extend_from_slice(header);
            body.extend_from_slice(author);
            body.extend_from_slice(format!(" {} +0000\n", time).as_bytes());
        }
        body.extend_from_slice(b"\nraw\n");

        let oid = repo.odb().unwrap().write(ObjectType::Commit, &body).unwrap();
        repo.reference(update_ref, oid, true, "raw commit").unwrap();
        oid
    }

    /// Tag the empty tree twice: `refs/tags/tree-annotated` and `refs/tags/tree-light`.
    pub fn tag_empty_tree(repo: &Repository) {
        let tree = repo.find_object(empty_tree(repo), None).unwrap();
        let sig = Signature::new("Test", "test@test.com", &Time::new(0, 0)).unwrap();

        repo.tag("tree-annotated", &tree, &sig, "a tree", false).unwrap();
        repo.reference("refs/tags/tree-light", tree.id(), false, "tree").unwrap();
    }
}
