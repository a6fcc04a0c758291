//! Parsers for `git` command output.

use tracing::debug;

use crate::graph::{CommitRecord, Hash, Ref};
use crate::source::error::{SourceError, SourceResult};

/// `--pretty=format:` string whose lines [`parse_log_line`] understands.
pub const LOG_FORMAT: &str = "|Commit| %H |Time| %at |Name| %an |Email| %ae |Parents| %P";

const COMMIT: &str = "|Commit| ";
const TIME: &str = " |Time| ";
const NAME: &str = " |Name| ";
const EMAIL: &str = " |Email| ";
const PARENTS: &str = " |Parents|";

/// `--format=` string whose lines [`parse_ref_list`] understands.
///
/// The `*` fields describe the object an annotated tag points at and are
/// empty for every other ref.
pub const REF_FORMAT: &str = "%(objectname) %(objecttype) %(*objectname) %(*objecttype) %(refname)";

/// Parse one line of `git log --pretty=format:LOG_FORMAT`.
pub fn parse_log_line(line: &str) -> SourceResult<CommitRecord> {
    let malformed = |reason: &str| SourceError::MalformedLog {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let rest = line
        .strip_prefix(COMMIT)
        .ok_or_else(|| malformed("missing commit marker"))?;
    let (hash, rest) = rest
        .split_once(TIME)
        .ok_or_else(|| malformed("missing time marker"))?;
    let (time, rest) = rest
        .split_once(NAME)
        .ok_or_else(|| malformed("missing name marker"))?;
    let (author_name, rest) = rest
        .split_once(EMAIL)
        .ok_or_else(|| malformed("missing email marker"))?;
    let (author_email, parents) = rest
        .rsplit_once(PARENTS)
        .ok_or_else(|| malformed("missing parents marker"))?;

    let timestamp = time
        .trim()
        .parse::<i64>()
        .map_err(|_| malformed("timestamp is not a number"))?;

    let parents = parents
        .split_whitespace()
        .map(parse_hash)
        .collect::<SourceResult<Vec<_>>>()?;

    Ok(CommitRecord {
        hash: parse_hash(hash.trim())?,
        timestamp,
        author_name: author_name.to_string(),
        author_email: author_email.to_string(),
        parents,
    })
}

/// Parse `git for-each-ref --format=REF_FORMAT` output.
///
/// Annotated tags are replaced by the commit they point at. Refs that do
/// not end at a commit (tags on trees or blobs, tags of tags) are skipped.
pub fn parse_ref_list(lines: &[String]) -> SourceResult<Vec<Ref>> {
    let mut refs = Vec::with_capacity(lines.len());

    for line in lines.iter().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.splitn(5, ' ').collect();
        let [object, kind, peeled, peeled_kind, name] = fields[..] else {
            return Err(SourceError::MalformedLog {
                line: line.clone(),
                reason: "expected five space-separated fields".to_string(),
            });
        };

        let hash = match (kind, peeled_kind) {
            ("commit", _) => object,
            ("tag", "commit") => peeled,
            _ => {
                debug!(name, kind, peeled_kind, "skipping ref that does not point at a commit");
                continue;
            }
        };
        refs.push(Ref::new(parse_hash(hash)?, name));
    }

    Ok(super::collapse_duplicate_refs(refs))
}

/// Parse `git count-objects -v` output into a total object count.
///
/// The total is loose objects (`count`) plus packed objects (`in-pack`).
pub fn parse_count_objects(lines: &[String]) -> SourceResult<u64> {
    let mut total = 0;

    for line in lines {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        if key == "count" || key == "in-pack" {
            total += value.trim().parse::<u64>().map_err(|_| SourceError::MalformedLog {
                line: line.clone(),
                reason: format!("{} is not a number", key),
            })?;
        }
    }

    Ok(total)
}

pub(crate) fn parse_hash(text: &str) -> SourceResult<Hash> {
    Hash::parse(text).map_err(|source| SourceError::InvalidHash {
        text: text.to_string(),
        source,
    })
}
