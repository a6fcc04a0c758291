//! Sync decision engine.
//!
//! Decides whether the stored graph still describes the live repository
//! and, when it does not, rebuilds and persists it. The staleness check is
//! coarse: the object count plus an exact, ordered comparison
//! of the ref list. Anything that moves either forces a full rebuild.

mod engine;
mod error;
mod report;

pub use engine::Synchronizer;
pub use error::{SyncError, SyncResult};
pub use report::{PhaseTiming, SyncReport};

use sha2::{Digest, Sha256};

use crate::graph::Ref;
use crate::storage::BaseInfo;

/// Lowercase hex SHA-256 over `"<hash> <name>\n"` for each ref, in order.
///
/// Stored in `.info` for inspection only; [`is_up_to_date`] compares the
/// full ref lists.
pub fn refs_signature(refs: &[Ref]) -> String {
    let mut hasher = Sha256::new();
    for r in refs {
        hasher.update(r.hash.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(r.name.as_bytes());
        hasher.update(b"\n");
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in digest.iter() {
        hex.push_str(&format!("{:02x}", b));
    }
    hex
}

/// True when the stored graph can be reused as is.
///
/// Requires the stored object count to equal `live_objects`, the stored
/// refs to match `live_refs` pairwise in order, and the last rebuild to
/// have completed.
pub fn is_up_to_date(info: &BaseInfo, stored_refs: &[Ref], live_objects: u64, live_refs: &[Ref]) -> bool {
    stale_reason(info, stored_refs, live_objects, live_refs).is_none()
}

pub(crate) fn stale_reason(
    info: &BaseInfo,
    stored_refs: &[Ref],
    live_objects: u64,
    live_refs: &[Ref],
) -> Option<&'static str> {
    if info.num_repo_objects != live_objects {
        return Some("object count changed");
    }
    if stored_refs.len() != live_refs.len() {
        return Some("ref count changed");
    }
    if stored_refs.iter().zip(live_refs).any(|(a, b)| a != b) {
        return Some("refs moved");
    }
    if !info.graph_up_to_date {
        return Some("previous rebuild did not finish");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Hash;

    fn h(n: u32) -> Hash {
        Hash::parse(&format!("{:040x}", n)).unwrap()
    }

    fn info(objects: u64, up_to_date: bool) -> BaseInfo {
        let mut info = BaseInfo::default();
        info.num_repo_objects = objects;
        info.graph_up_to_date = up_to_date;
        info
    }

    #[test]
    fn test_refs_signature() {
        assert_eq!(
            refs_signature(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        let a = Ref::new(h(1), "refs/heads/main");
        let b = Ref::new(h(2), "refs/tags/v1");
        let forward = refs_signature(&[a.clone(), b.clone()]);

        assert_eq!(forward.len(), 64);
        assert_eq!(forward, refs_signature(&[a.clone(), b.clone()]));
        assert_ne!(forward, refs_signature(&[b, a]));
    }

    #[test]
    fn test_up_to_date_when_everything_matches() {
        let refs = vec![Ref::new(h(1), "refs/heads/main")];
        assert!(is_up_to_date(&info(10, true), &refs, 10, &refs));
    }

    #[test]
    fn test_each_mismatch_forces_rebuild() {
        let refs = vec![
            Ref::new(h(1), "refs/heads/main"),
            Ref::new(h(2), "refs/tags/v1"),
        ];
        let stored = info(10, true);

        assert!(!is_up_to_date(&stored, &refs, 11, &refs));
        assert!(!is_up_to_date(&stored, &refs, 10, &refs[..1]));
        assert!(!is_up_to_date(&info(10, false), &refs, 10, &refs));

        let moved = vec![Ref::new(h(3), "refs/heads/main"), refs[1].clone()];
        assert!(!is_up_to_date(&stored, &refs, 10, &moved));

        let reordered = vec![refs[1].clone(), refs[0].clone()];
        assert_eq!(
            stale_reason(&stored, &refs, 10, &reordered),
            Some("refs moved")
        );
    }

    #[test]
    fn test_empty_repository_is_up_to_date_once_built() {
        assert!(!is_up_to_date(&BaseInfo::default(), &[], 0, &[]));
        assert!(is_up_to_date(&info(0, true), &[], 0, &[]));
    }
}
