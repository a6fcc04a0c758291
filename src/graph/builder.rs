//! Graph indexing and child-edge derivation.
//!
//! The graph is an arena: commits live in a `Vec` in the order they were
//! supplied, a hash index maps each hash to its slot, and parent edges are
//! resolved to slot numbers once, when the graph is built. All mutation
//! (adding children) goes through the owning [`CommitGraph`].

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::types::{Commit, CommitRecord, Hash, Ref};

/// An indexed set of commits with resolved parent links.
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    commits: Vec<Commit>,
    index: HashMap<Hash, usize>,
    /// parent slots, parallel to `commits`
    parent_links: Vec<Vec<usize>>,
}

impl CommitGraph {
    /// Index raw commit records (parents only).
    ///
    /// Fails if a hash appears twice or if any parent is absent from the
    /// record set; both mean the source returned an inconsistent log.
    pub fn from_records(records: Vec<CommitRecord>) -> GraphResult<Self> {
        Self::from_commits(records.into_iter().map(Commit::from).collect())
    }

    /// Index commits that may already carry children (e.g. loaded from disk).
    pub fn from_commits(commits: Vec<Commit>) -> GraphResult<Self> {
        let mut index = HashMap::with_capacity(commits.len());
        for (slot, commit) in commits.iter().enumerate() {
            if index.insert(commit.hash.clone(), slot).is_some() {
                return Err(GraphError::DuplicateCommit(commit.hash.clone()));
            }
        }

        // closure check: every parent must be a key
        let mut parent_links = Vec::with_capacity(commits.len());
        for commit in &commits {
            let mut links = Vec::with_capacity(commit.parents.len());
            for parent in &commit.parents {
                let slot = index.get(parent).ok_or_else(|| GraphError::MissingParent {
                    commit: commit.hash.clone(),
                    parent: parent.clone(),
                })?;
                links.push(*slot);
            }
            parent_links.push(links);
        }

        Ok(Self {
            commits,
            index,
            parent_links,
        })
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&Commit> {
        self.index.get(hash).map(|&slot| &self.commits[slot])
    }

    /// iterate commits in the order they were supplied
    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter()
    }

    /// all commits without parents, in supplied order
    pub fn roots(&self) -> Vec<Hash> {
        self.commits
            .iter()
            .filter(|c| c.is_root())
            .map(|c| c.hash.clone())
            .collect()
    }

    /// Derive child edges by walking first-parent chains from each seed.
    ///
    /// Seeds that are not in the graph are ignored. Children are a set, so
    /// running this again (with the same or a reordered seed list) leaves
    /// every commit's children unchanged.
    pub fn derive_children(&mut self, seeds: &[Hash]) -> Traversal {
        let mut queue: VecDeque<(usize, Option<usize>)> = VecDeque::new();
        let mut seeded = HashSet::new();
        for seed in seeds {
            if let Some(&slot) = self.index.get(seed) {
                if seeded.insert(slot) {
                    queue.push_back((slot, None));
                }
            }
        }

        let mut visited = vec![false; self.commits.len()];
        let mut visited_count = 0;
        let mut steps = 0;

        while let Some((start, origin)) = queue.pop_front() {
            let mut current = Some(start);
            let mut origin = origin;

            // follow this commit to the end of its first-parent chain
            while let Some(slot) = current {
                steps += 1;

                // `origin` is the commit we stepped down from, so it is a child of `slot`
                if let Some(origin) = origin {
                    let child = self.commits[origin].hash.clone();
                    self.commits[slot].children.insert(child);
                }

                // edge recorded; ancestors of a visited commit are already linked
                if visited[slot] {
                    break;
                }
                visited[slot] = true;
                visited_count += 1;

                current = match self.parent_links[slot].split_first() {
                    None => None,
                    Some((&first, rest)) => {
                        for &parent in rest {
                            queue.push_back((parent, Some(slot)));
                        }
                        Some(first)
                    }
                };
                origin = Some(slot);
            }
        }

        let unreachable = self
            .commits
            .iter()
            .zip(&visited)
            .filter(|&(_, &seen)| !seen)
            .map(|(c, _)| c.hash.clone())
            .collect();

        Traversal {
            visited: visited_count,
            steps,
            unreachable,
        }
    }

    /// hand the commits back, in supplied order
    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }
}

/// Outcome of one child-derivation walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// number of distinct commits reached
    pub visited: usize,
    /// number of chain steps taken, including stops at visited commits
    pub steps: usize,
    /// commits never reached from any seed, in supplied order
    pub unreachable: Vec<Hash>,
}

/// An annotated graph plus the ref bookkeeping computed alongside it.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: CommitGraph,
    /// commits without parents
    pub roots: Vec<Hash>,
    /// refs whose commit ended up with no children
    pub tips: Vec<Ref>,
    /// refs whose hash is not in the commit set
    pub dangling_refs: Vec<Ref>,
    pub traversal: Traversal,
}

impl BuiltGraph {
    /// true when every commit was reached from some ref
    pub fn is_fully_reachable(&self) -> bool {
        self.traversal.visited == self.graph.len()
    }
}

/// Builds an annotated graph from raw records and the live ref list.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Index the records, derive children from every ref and compute tips.
    ///
    /// Dangling refs are reported and skipped. Unreachable commits stay in
    /// the graph with no children. A missing parent is fatal.
    pub fn build(records: Vec<CommitRecord>, refs: &[Ref]) -> GraphResult<BuiltGraph> {
        let mut graph = CommitGraph::from_records(records)?;

        let (graph_tips, dangling_refs): (Vec<Ref>, Vec<Ref>) =
            refs.iter().cloned().partition(|r| graph.contains(&r.hash));

        if !dangling_refs.is_empty() {
            warn!(count = dangling_refs.len(), "refs missing from repository");
            for r in &dangling_refs {
                warn!(hash = %r.hash, name = %r.name, "dangling ref");
            }
        }

        let seeds: Vec<Hash> = graph_tips.iter().map(|r| r.hash.clone()).collect();
        let traversal = graph.derive_children(&seeds);
        debug!(
            visited = traversal.visited,
            commits = graph.len(),
            steps = traversal.steps,
            "derived children"
        );

        if !traversal.unreachable.is_empty() {
            warn!(
                visited = traversal.visited,
                commits = graph.len(),
                "commits not reachable from any ref"
            );
            for hash in &traversal.unreachable {
                warn!(%hash, "unreachable commit");
            }
        }

        // a ref stays a tip only if nothing ended up built on top of it
        let tips = graph_tips
            .into_iter()
            .filter(|r| graph.get(&r.hash).is_some_and(|c| c.children.is_empty()))
            .collect();

        let roots = graph.roots();

        Ok(BuiltGraph {
            graph,
            roots,
            tips,
            dangling_refs,
            traversal,
        })
    }
}
