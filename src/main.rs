use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use merge_index::cli::Cli;
use merge_index::error::{EXIT_FATAL, EXIT_USAGE, MergeIndexError};
use merge_index::invoke::{self, CommandRunner};
use merge_index::{execute, telemetry};
use merge_index_git::GixRepo;

fn main() -> ExitCode {
    // Must happen before any child is spawned.
    invoke::reset_child_signal();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let _telemetry = telemetry::init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let known = err.downcast_ref::<MergeIndexError>();
            match known {
                Some(e) if e.is_silent() => {}
                Some(MergeIndexError::Usage(msg)) if msg.starts_with("usage:") => {
                    eprintln!("{msg}");
                }
                _ => eprintln!("fatal: {err:#}"),
            }
            ExitCode::from(known.map_or(EXIT_FATAL, MergeIndexError::exit_code))
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let invocation = cli.into_invocation()?;

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let repo = GixRepo::discover(&cwd).context("not a git repository")?;

    let summary = execute(&repo, invocation, CommandRunner)?;
    Ok(summary.exit_code())
}
