//! Command-line surface.
//!
//! ```text
//! merge-index [-o] [-q] <merge-program> (-a | [--] [<filename>...])
//! ```
//!
//! Everything from `<merge-program>` on is taken verbatim and interpreted in
//! order: `-a` merges all conflicted paths, `--` makes every later argument a
//! filename (including `-a`), and any other dash argument before `--` is an
//! error. Filenames are kept as raw OS strings and matched against index
//! paths byte for byte.
//!
//! `-o` and `-q` are ordinary flags and may be given in either order or
//! combined (`-oq`), but only before `<merge-program>`.

use std::ffi::OsString;

use clap::Parser;
use merge_index_git::IndexPath;

use crate::error::MergeIndexError;
use crate::run::{RunOptions, Target};

const USAGE: &str = "merge-index [-o] [-q] <merge-program> (-a | [--] [<filename>...])";

/// Run a merge program for each unmerged path in the index
///
/// For every conflicted path the program is called as:
///
///   <merge-program> <oid1> <oid2> <oid3> <path> <mode1> <mode2> <mode3>
///
/// where 1, 2 and 3 are the common ancestor, ours and theirs. A missing
/// stage is passed as an empty string.
#[derive(Parser, Debug)]
#[command(name = "merge-index")]
#[command(version, about)]
#[command(override_usage = USAGE)]
pub struct Cli {
    /// Keep going after the merge program fails; exit with the failure count
    #[arg(short = 'o', long = "one-shot")]
    pub one_shot: bool,

    /// Do not complain about a failed merge program
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// The merge program followed by `-a`, `--` and filenames
    #[arg(
        value_name = "MERGE-PROGRAM",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub words: Vec<OsString>,
}

/// A validated invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Merge program as given (aliases not yet resolved).
    pub program: OsString,
    /// Failure policy switches from the command line.
    pub options: RunOptions,
    /// Work items in command-line order.
    pub targets: Vec<Target>,
}

impl Cli {
    /// Turn parsed arguments into an [`Invocation`].
    ///
    /// # Errors
    /// [`MergeIndexError::Usage`] when only a program is given, or for an
    /// unknown option before `--`.
    pub fn into_invocation(self) -> Result<Invocation, MergeIndexError> {
        let given = usize::from(self.one_shot) + usize::from(self.quiet) + self.words.len();
        if given < 2 {
            return Err(MergeIndexError::Usage(format!("usage: {USAGE}")));
        }

        let mut words = self.words.into_iter();
        let program = words.next().unwrap_or_default();
        let rest: Vec<OsString> = words.collect();

        Ok(Invocation {
            program,
            options: RunOptions {
                one_shot: self.one_shot,
                quiet: self.quiet,
            },
            targets: parse_targets(&rest)?,
        })
    }
}

/// Interpret the arguments after the merge program.
///
/// # Errors
/// [`MergeIndexError::Usage`] for a dash argument other than `-a` or `--`
/// before `--`.
pub fn parse_targets(args: &[OsString]) -> Result<Vec<Target>, MergeIndexError> {
    let mut targets = Vec::with_capacity(args.len());
    let mut force_file = false;
    for arg in args {
        if !force_file && arg.as_encoded_bytes().starts_with(b"-") {
            if arg == "--" {
                force_file = true;
            } else if arg == "-a" {
                targets.push(Target::All);
            } else {
                return Err(MergeIndexError::Usage(format!(
                    "unknown option {}",
                    arg.to_string_lossy()
                )));
            }
            continue;
        }
        targets.push(Target::Path(IndexPath::from_os_string(arg.clone())));
    }
    Ok(targets)
}
