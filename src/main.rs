//! vcsloc - command-line entry point
//!
//! Opens (or creates) a database for a repository, brings its commit graph
//! up to date and prints a summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use vcsloc::db::{Database, DatabaseConfig, DatabaseError, VcsKind};

/// Keep a local copy of a repository's commit graph up to date.
#[derive(Debug, Parser)]
#[command(name = "vcsloc", version, about)]
struct Cli {
    /// Repository to analyze (required when the database is created)
    #[arg(long, value_name = "PATH")]
    repo: Option<PathBuf>,

    /// Backend to read the repository with: git or git-cli (required when the database is created)
    #[arg(long, value_name = "NAME")]
    vcs: Option<String>,

    /// Database directory
    #[arg(long, value_name = "PATH", env = "VCSLOC_DB")]
    db: PathBuf,

    /// Log fetched refs and commits
    #[arg(short, long)]
    verbose: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Anything that makes the command fail.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("cannot encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    /// 1 for errors fixed by changing the invocation, 2 for everything else
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Database(e) if e.is_config() => 1,
            _ => 2,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // help and version are not usage errors
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Human-readable logs on stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = DatabaseConfig::new(&cli.db).verbose(cli.verbose);
    if let Some(repo) = &cli.repo {
        config = config.repo_path(repo);
    }
    if let Some(vcs) = &cli.vcs {
        config = config.vcs(vcs.parse::<VcsKind>()?);
    }

    let mut db = Database::open_with_config(config)?;
    let report = db.analyze()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let usage = CliError::from(DatabaseError::MissingVcs);
        assert_eq!(usage.exit_code(), 1);

        let encode = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = CliError::from(encode);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("cannot encode report: "));

        let db = std::path::Path::new("/nonexistent/vcsloc-db");
        let err = CliError::from(Database::open(db).err().unwrap());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from(["vcsloc", "--db", "/tmp/db", "--vcs", "git-cli", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.vcs.as_deref(), Some("git-cli"));
        assert!(cli.repo.is_none());
    }
}
