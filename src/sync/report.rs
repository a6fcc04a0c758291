//! What a synchronization run found and how long each phase took.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::graph::{CommitGraph, Hash, Ref};

/// Wall-clock time of one phase of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseTiming {
    pub phase: &'static str,
    pub elapsed_ms: u64,
}

impl PhaseTiming {
    pub(crate) fn new(phase: &'static str, elapsed: Duration) -> Self {
        Self {
            phase,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Summary of one [`Synchronizer::run`](crate::sync::Synchronizer::run).
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    /// true when the stored graph was reused without fetching the log
    pub up_to_date: bool,
    pub objects: u64,
    pub refs: usize,
    pub commits: usize,
    /// commits not in the previously stored hash list
    pub new_commits: usize,
    /// commits with more than one parent
    pub merges: usize,
    pub roots: Vec<Hash>,
    pub tips: Vec<Ref>,
    pub dangling_refs: Vec<Ref>,
    pub unreachable: Vec<Hash>,
    /// roots reported by the source that are not parentless commits in the graph
    pub root_mismatches: Vec<Hash>,
    pub oldest_commit: Option<DateTime<Utc>>,
    pub newest_commit: Option<DateTime<Utc>>,
    pub files_written: usize,
    pub phases: Vec<PhaseTiming>,
}

impl SyncReport {
    pub(crate) fn new(started_at: DateTime<Utc>, objects: u64, refs: usize) -> Self {
        Self {
            started_at,
            up_to_date: false,
            objects,
            refs,
            commits: 0,
            new_commits: 0,
            merges: 0,
            roots: Vec::new(),
            tips: Vec::new(),
            dangling_refs: Vec::new(),
            unreachable: Vec::new(),
            root_mismatches: Vec::new(),
            oldest_commit: None,
            newest_commit: None,
            files_written: 0,
            phases: Vec::new(),
        }
    }

    /// Fill in the commit count and date range from `graph`.
    pub(crate) fn describe_graph(&mut self, graph: &CommitGraph) {
        self.commits = graph.len();
        self.merges = graph.iter().filter(|c| c.is_merge()).count();
        self.oldest_commit = graph.iter().map(|c| c.timestamp).min().and_then(to_datetime);
        self.newest_commit = graph.iter().map(|c| c.timestamp).max().and_then(to_datetime);
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.phases.iter().map(|p| p.elapsed_ms).sum()
    }
}

fn to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.up_to_date { "up to date" } else { "rebuilt" };
        writeln!(f, "graph {}", state)?;
        writeln!(f, "  objects:       {}", self.objects)?;
        writeln!(f, "  refs:          {}", self.refs)?;
        writeln!(f, "  commits:       {} ({} new)", self.commits, self.new_commits)?;
        writeln!(f, "  merges:        {}", self.merges)?;
        writeln!(f, "  roots:         {}", self.roots.len())?;
        writeln!(f, "  tips:          {}", self.tips.len())?;

        if !self.dangling_refs.is_empty() {
            writeln!(f, "  dangling refs: {}", self.dangling_refs.len())?;
        }
        if !self.unreachable.is_empty() {
            writeln!(f, "  unreachable:   {}", self.unreachable.len())?;
        }
        if !self.root_mismatches.is_empty() {
            writeln!(f, "  bad roots:     {}", self.root_mismatches.len())?;
        }

        if let (Some(oldest), Some(newest)) = (self.oldest_commit, self.newest_commit) {
            writeln!(
                f,
                "  history:       {} .. {}",
                oldest.format("%Y-%m-%d"),
                newest.format("%Y-%m-%d")
            )?;
        }

        for phase in &self.phases {
            writeln!(f, "  {:<14} {} ms", format!("{}:", phase.phase), phase.elapsed_ms)?;
        }
        write!(f, "  total:         {} ms", self.total_elapsed_ms())
    }
}
