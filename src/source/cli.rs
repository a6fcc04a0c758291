//! Repository source backed by the `git` executable.
//!
//! Each query runs one `git` subprocess. Standard output is read line by
//! line on the calling thread while standard error is drained on a
//! background thread, so neither pipe can fill up and stall the child.
//! Output is decoded lossily: author names are not guaranteed to be UTF-8.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::graph::{CommitRecord, Hash, Ref};
use crate::source::error::{SourceError, SourceResult};
use crate::source::log::{parse_count_objects, parse_hash, parse_log_line, parse_ref_list, LOG_FORMAT, REF_FORMAT};
use crate::source::RepoSource;

/// Output captured from one finished command.
#[derive(Debug)]
struct CommandOutput {
    stdout: Vec<String>,
    elapsed: Duration,
}

/// Runs `git` against a working directory.
#[derive(Debug, Clone)]
pub struct GitCliSource {
    repo_path: PathBuf,
    git: PathBuf,
}

impl GitCliSource {
    /// Create a source for the repository at `repo_path`.
    ///
    /// Fails if `git` is not on PATH.
    pub fn new(repo_path: impl AsRef<Path>) -> SourceResult<Self> {
        let repo_path = repo_path.as_ref();
        if !repo_path.is_dir() {
            return Err(SourceError::NotARepository(repo_path.to_path_buf()));
        }

        Ok(Self {
            repo_path: repo_path.to_path_buf(),
            git: lookup_path("git")?,
        })
    }

    /// Get the repository path.
    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    fn run(&self, args: &[&str]) -> SourceResult<CommandOutput> {
        let output = run_external(&self.git, &self.repo_path, args)?;
        debug!(
            args = %args.join(" "),
            lines = output.stdout.len(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "git"
        );
        Ok(output)
    }
}

impl RepoSource for GitCliSource {
    fn object_count(&self) -> SourceResult<u64> {
        let output = self.run(&["count-objects", "-v"])?;
        parse_count_objects(&output.stdout)
    }

    fn list_refs(&self) -> SourceResult<Vec<Ref>> {
        let format = format!("--format={}", REF_FORMAT);
        let output = self.run(&["for-each-ref", &format])?;
        parse_ref_list(&output.stdout)
    }

    fn root_commits(&self) -> SourceResult<Vec<Hash>> {
        let output = self.run(&["rev-list", "--max-parents=0", "--all"])?;
        hashes_from_lines(&output.stdout)
    }

    fn all_commit_hashes(&self) -> SourceResult<Vec<Hash>> {
        let output = self.run(&["rev-list", "--all"])?;
        hashes_from_lines(&output.stdout)
    }

    fn commit_log(&self) -> SourceResult<Vec<CommitRecord>> {
        let format = format!("--pretty=format:{}", LOG_FORMAT);
        let output = self.run(&["log", "--all", &format])?;
        output
            .stdout
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| parse_log_line(l))
            .collect()
    }
}

fn hashes_from_lines(lines: &[String]) -> SourceResult<Vec<Hash>> {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| parse_hash(l.trim()))
        .collect()
}

/// Run an external command to completion, collecting stdout as lines.
fn run_external(exe: &Path, working_dir: &Path, args: &[&str]) -> SourceResult<CommandOutput> {
    let command_line = format!("{} {}", exe.display(), args.join(" "));
    let start = Instant::now();

    let mut child = Command::new(exe)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr_pipe = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_end(&mut bytes);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    });

    let stdout = match child.stdout.take().map(read_lines_lossy).transpose() {
        Ok(lines) => lines.unwrap_or_default(),
        Err(e) => {
            // the child may be blocked on a full pipe; reap it before bailing
            let _ = child.kill();
            let _ = child.wait();
            let _ = stderr_reader.join();
            return Err(e.into());
        }
    };

    // wait for stderr before timing so both streams are fully consumed
    let stderr = stderr_reader.join().unwrap_or_default();
    let status = child.wait()?;
    let elapsed = start.elapsed();

    if !status.success() {
        return Err(SourceError::CommandFailed {
            command: command_line,
            code: status.code(),
            stderr,
        });
    }

    Ok(CommandOutput { stdout, elapsed })
}

/// Split `reader` on `\n`, dropping a trailing `\r` and replacing invalid UTF-8.
fn read_lines_lossy(reader: impl Read) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in BufReader::new(reader).split(b'\n') {
        let line = line?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        lines.push(String::from_utf8_lossy(line).into_owned());
    }
    Ok(lines)
}

fn command_paths() -> &'static Mutex<HashMap<String, PathBuf>> {
    static PATHS: OnceLock<Mutex<HashMap<String, PathBuf>>> = OnceLock::new();
    PATHS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Find an executable on PATH, memoising the answer.
fn lookup_path(exe: &str) -> SourceResult<PathBuf> {
    if let Some(found) = command_paths().lock().get(exe) {
        return Ok(found.clone());
    }

    let search = std::env::var_os("PATH").unwrap_or_default();
    let candidates = [exe.to_string(), format!("{}{}", exe, std::env::consts::EXE_SUFFIX)];

    let found = std::env::split_paths(&search)
        .flat_map(|dir| candidates.iter().map(move |name| dir.join(OsStr::new(name))))
        .find(|path| path.is_file())
        .ok_or_else(|| SourceError::NotInstalled(exe.to_string()))?;

    command_paths().lock().insert(exe.to_string(), found.clone());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_repository_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            GitCliSource::new(&missing),
            Err(SourceError::NotARepository(_))
        ));
    }

    #[test]
    fn test_lookup_unknown_executable() {
        assert!(matches!(
            lookup_path("vcsloc-no-such-tool"),
            Err(SourceError::NotInstalled(_))
        ));
    }

    fn cli_source(path: &Path) -> Option<GitCliSource> {
        match GitCliSource::new(path) {
            Ok(cli) => Some(cli),
            // nothing to compare against without a git executable
            Err(SourceError::NotInstalled(_)) => None,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_matches_libgit_source() {
        use crate::source::fixtures::{commit, tag_empty_tree};
        use crate::source::LibGitSource;

        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let a = commit(&repo, None, &[], 100, "A");
        let b = commit(&repo, Some("refs/heads/side"), &[a], 200, "B");
        let c = commit(&repo, None, &[a], 300, "C");
        commit(&repo, Some("refs/heads/main"), &[c, b], 400, "M");
        let target = repo.find_object(c, None).unwrap();
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        repo.tag("v1.0", &target, &sig, "release", false).unwrap();
        tag_empty_tree(&repo);

        let Some(cli) = cli_source(dir.path()) else { return };
        let lib = LibGitSource::open(dir.path()).unwrap();

        let refs = cli.list_refs().unwrap();
        assert_eq!(refs, lib.list_refs().unwrap());
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["refs/heads/main", "refs/heads/side", "refs/tags/v1.0"]);
        assert_eq!(refs[2].hash, Hash::from(c));
        assert_eq!(cli.root_commits().unwrap(), vec![Hash::from(a)]);

        let mut cli_log = cli.commit_log().unwrap();
        let mut lib_log = lib.commit_log().unwrap();
        cli_log.sort_by(|x, y| x.hash.cmp(&y.hash));
        lib_log.sort_by(|x, y| x.hash.cmp(&y.hash));
        assert_eq!(cli_log, lib_log);
        assert_eq!(cli.all_commit_hashes().unwrap().len(), 4);
    }

    #[test]
    fn test_empty_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let Some(cli) = cli_source(dir.path()) else { return };

        assert!(cli.list_refs().unwrap().is_empty());
    }

    #[test]
    fn test_non_utf8_author_is_decoded_lossily() {
        use crate::source::fixtures::raw_commit;

        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let a = raw_commit(&repo, "refs/heads/main", b"Ren\xe9 M\xfcller <rene@example.org>", 100);
        let Some(cli) = cli_source(dir.path()) else { return };

        let log = cli.commit_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].hash, Hash::from(a));
        assert!(log[0].author_name.starts_with("Ren"));
        assert!(log[0].author_name.ends_with("ller"));
        assert_eq!(log[0].author_email, "rene@example.org");
    }

    #[test]
    fn test_read_lines_lossy() {
        let lines = read_lines_lossy(&b"plain\r\nRen\xe9\n\nlast"[..]).unwrap();
        assert_eq!(lines, vec!["plain", "Ren\u{fffd}", "", "last"]);
    }

    #[test]
    fn test_hashes_from_lines() {
        let lines = vec!["a".repeat(40), String::new(), "b".repeat(40)];
        let hashes = hashes_from_lines(&lines).unwrap();
        assert_eq!(hashes.len(), 2);

        let bad = vec!["not-a-hash".to_string()];
        assert!(hashes_from_lines(&bad).is_err());
    }
}
