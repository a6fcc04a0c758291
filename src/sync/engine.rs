//! One synchronization run against a repository source.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, info_span, warn};

use crate::graph::{CommitGraph, GraphBuilder, Hash, Ref};
use crate::source::RepoSource;
use crate::storage::{Section, VcsDatabase};
use crate::sync::error::SyncResult;
use crate::sync::report::{PhaseTiming, SyncReport};
use crate::sync::{refs_signature, stale_reason};

/// Brings a loaded [`VcsDatabase`] in line with a repository.
pub struct Synchronizer<'a> {
    source: &'a dyn RepoSource,
    phases: Vec<PhaseTiming>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(source: &'a dyn RepoSource) -> Self {
        Self {
            source,
            phases: Vec::new(),
        }
    }

    /// Run one synchronization.
    ///
    /// `db` must already be loaded. If the stored signature matches the
    /// repository nothing is fetched beyond the object count and refs.
    /// Otherwise the graph is flagged stale on disk, rebuilt from a fresh
    /// commit log and saved. Any error leaves the stale flag in place.
    pub fn run(mut self, db: &mut VcsDatabase) -> SyncResult<SyncReport> {
        let started_at = Utc::now();
        let source = self.source;

        let objects = self.phase("count_objects", || source.object_count())?;
        info!(objects, "counted repository objects");

        let refs = self.phase("fetch_refs", || source.list_refs())?;
        info!(refs = refs.len(), "fetched refs");
        for r in &refs {
            debug!(hash = %r.hash, name = %r.name, "ref");
        }

        let mut report = SyncReport::new(started_at, objects, refs.len());

        match stale_reason(&db.info, &db.refs.refs, objects, &refs) {
            None => {
                info!("stored graph is up to date");
                describe_stored(&mut report, &db.commits.graph, &refs);
                report.up_to_date = true;
                report.phases = self.phases;
                return Ok(report);
            }
            Some(reason) => info!(reason, "rebuilding commit graph"),
        }

        db.mark_stale()?;

        let hashes = self.phase("fetch_hashes", || source.all_commit_hashes())?;
        let stored: HashSet<&Hash> = db.commits.hashes.iter().collect();
        report.new_commits = hashes.iter().filter(|h| !stored.contains(h)).count();
        info!(commits = hashes.len(), new = report.new_commits, "fetched commit hashes");

        let records = self.phase("fetch_commits", || source.commit_log())?;
        info!(commits = records.len(), "fetched commit log");
        for record in &records {
            debug!(
                hash = %record.hash,
                timestamp = record.timestamp,
                author = %record.author_email,
                parents = record.parents.len(),
                "commit"
            );
        }

        let built = self.phase("build_graph", || GraphBuilder::build(records, &refs))?;
        info!(
            commits = built.graph.len(),
            roots = built.roots.len(),
            tips = built.tips.len(),
            "built commit graph"
        );

        let source_roots = self.phase("check_roots", || source.root_commits())?;
        report.root_mismatches = cross_check_roots(&built.graph, &source_roots);
        for hash in &report.root_mismatches {
            warn!(%hash, "source reports a root the graph does not agree with");
        }

        report.describe_graph(&built.graph);
        report.roots = built.roots;
        report.tips = built.tips;
        report.dangling_refs = built.dangling_refs;
        report.unreachable = built.traversal.unreachable;

        db.info.num_repo_objects = objects;
        db.info.num_repo_commits = built.graph.len() as u64;
        db.info.refs_signature = refs_signature(&refs);
        db.info.graph_up_to_date = true;
        db.info.set_dirty(true);
        db.refs.replace(refs);
        db.commits.replace(hashes, built.graph);

        report.files_written = self.phase("save", || db.save())?;
        info!(files = report.files_written, "saved database");

        report.phases = self.phases;
        Ok(report)
    }

    /// Time `f` under a span named after the phase.
    fn phase<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let span = info_span!("phase", name);
        let _guard = span.enter();

        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();

        debug!(elapsed_ms = elapsed.as_millis() as u64, "phase finished");
        self.phases.push(PhaseTiming::new(name, elapsed));
        out
    }
}

/// Roots from the source that are missing from the graph or have parents.
pub(crate) fn cross_check_roots(graph: &CommitGraph, roots: &[Hash]) -> Vec<Hash> {
    roots
        .iter()
        .filter(|h| !graph.get(h).is_some_and(|c| c.is_root()))
        .cloned()
        .collect()
}

/// Fill a report from the stored graph when no rebuild happened.
fn describe_stored(report: &mut SyncReport, graph: &CommitGraph, refs: &[Ref]) {
    report.describe_graph(graph);
    report.roots = graph.roots();

    for r in refs {
        match graph.get(&r.hash) {
            Some(commit) if commit.children.is_empty() => report.tips.push(r.clone()),
            Some(_) => {}
            None => report.dangling_refs.push(r.clone()),
        }
    }
}
