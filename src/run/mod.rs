//! The run controller: walks targets, invokes the merge program per
//! conflicted path and applies the failure policy.
//!
//! | `-o` | `-q` | on merge program failure                         |
//! |------|------|--------------------------------------------------|
//! | yes  | any  | count it, continue with the next path            |
//! | no   | no   | stop with `merge program failed`                 |
//! | no   | yes  | stop silently with status 1                      |
//!
//! A launch failure or an unknown path always stops the run. After a `-o`
//! run, any counted failure is reported unless `-q` was given; the final
//! status is then the failure count.

use std::ffi::OsString;

use merge_index_git::{GitRepo, IndexPath, IndexSnapshot};
use tracing::instrument;

use crate::args::MergeArgs;
use crate::cli::Invocation;
use crate::config::MergeIndexConfig;
use crate::error::MergeIndexError;
use crate::group::build_group;
use crate::invoke::{ExitInfo, Outcome, ProcessRunner};

#[cfg(test)]
mod scan_proptests;

/// Failure-handling switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// `-o`: count failures and keep going.
    pub one_shot: bool,
    /// `-q`: never print a diagnostic for a failed merge program.
    pub quiet: bool,
}

/// Mutable state of one run. Touched only by [`Controller`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    /// Options the run was started with.
    pub options: RunOptions,
    /// Merge program failures absorbed under `-o`.
    pub failures: u32,
    /// Number of merge program invocations so far.
    pub invoked: usize,
    last_failure: Option<ExitInfo>,
}

impl RunState {
    /// Fresh state for `options`.
    #[must_use]
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// One unit of work from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// `-a`: every conflicted path in the index.
    All,
    /// An explicit path.
    Path(IndexPath),
}

/// Totals of a run that reached the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Merge program invocations.
    pub invoked: usize,
    /// Failures counted under `-o`.
    pub failures: u32,
}

impl RunSummary {
    /// Process exit status: the failure count, saturated to fit a byte.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failures).unwrap_or(u8::MAX)
    }
}

/// Run a parsed invocation against `repo`.
///
/// Loads `merge-index.toml` from the git directory, applies its defaults
/// and program aliases, reads the index once and processes every target.
///
/// # Errors
/// Any error the controller escalates, plus config and index read failures.
#[instrument(skip_all, fields(program = %invocation.program.to_string_lossy()))]
pub fn execute<R: ProcessRunner>(
    repo: &dyn GitRepo,
    invocation: Invocation,
    runner: R,
) -> Result<RunSummary, MergeIndexError> {
    let config = MergeIndexConfig::load(&MergeIndexConfig::path_in(repo.git_dir()))?;
    let options = config.effective_options(invocation.options);
    let program = config.resolve_program(&invocation.program).to_owned();

    let index = repo.read_index()?;
    tracing::debug!(entries = index.len(), ?options, ?program, "starting run");

    let mut controller = Controller::new(&index, repo, runner, program, options);
    controller.run_targets(&invocation.targets)?;
    controller.finish()
}

/// Drives the merge program over an index snapshot.
pub struct Controller<'a, R> {
    index: &'a IndexSnapshot,
    repo: &'a dyn GitRepo,
    runner: R,
    program: OsString,
    state: RunState,
}

impl<'a, R: ProcessRunner> Controller<'a, R> {
    /// Create a controller. `repo` is only consulted for paths hidden inside
    /// sparse-directory placeholders.
    pub fn new(
        index: &'a IndexSnapshot,
        repo: &'a dyn GitRepo,
        runner: R,
        program: impl Into<OsString>,
        options: RunOptions,
    ) -> Self {
        Self {
            index,
            repo,
            runner,
            program: program.into(),
            state: RunState::new(options),
        }
    }

    /// Current run state.
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Process each target in command-line order.
    ///
    /// # Errors
    /// Stops at the first error that the failure policy does not absorb.
    pub fn run_targets(&mut self, targets: &[Target]) -> Result<(), MergeIndexError> {
        for target in targets {
            match target {
                Target::All => self.merge_all()?,
                Target::Path(path) => self.merge_one_path(path)?,
            }
        }
        Ok(())
    }

    /// Merge a single named path.
    ///
    /// A path that is resolved at stage 0 is left alone, as is a path inside
    /// a sparse-directory placeholder (those only ever hold merged content).
    ///
    /// # Errors
    /// [`MergeIndexError::PathNotIndexed`] if the index has no record of
    /// `path`; otherwise whatever the failure policy escalates.
    #[instrument(skip_all, fields(path = %path))]
    pub fn merge_one_path(&mut self, path: &IndexPath) -> Result<(), MergeIndexError> {
        let index = self.index;
        let pos = match index.name_pos(path) {
            Ok(_) => {
                tracing::debug!("already merged");
                return Ok(());
            }
            Err(pos) => pos,
        };

        let starts_here = index.entries().get(pos).is_some_and(|e| e.path == *path);
        if !starts_here
            && let Some(dir) = index.covering_sparse_dir(path)
            && self.repo.sparse_dir_contains(dir, path)?
        {
            tracing::debug!(sparse_dir = %dir.path, "inside collapsed directory, already merged");
            return Ok(());
        }

        self.merge_entry(pos, path).map(|_| ())
    }

    /// Merge every conflicted path, scanning the index once.
    ///
    /// Stage-0 records (resolved entries and sparse-directory placeholders)
    /// are stepped over one at a time; a conflicted run is handed to the
    /// group builder and skipped as a whole.
    ///
    /// # Errors
    /// Whatever the failure policy escalates.
    #[instrument(skip(self), fields(entries = self.index.len()))]
    pub fn merge_all(&mut self) -> Result<(), MergeIndexError> {
        let index = self.index;
        let entries = index.entries();
        let mut pos = 0;
        while let Some(entry) = entries.get(pos) {
            if entry.stage.is_conflict() {
                pos += self.merge_entry(pos, &entry.path)?;
            } else {
                pos += 1;
            }
        }
        Ok(())
    }

    /// Finish the run, reporting failures counted under `-o`.
    ///
    /// # Errors
    /// [`MergeIndexError::ToolFailed`] if any failure was counted and `-q`
    /// is off.
    pub fn finish(self) -> Result<RunSummary, MergeIndexError> {
        let summary = RunSummary {
            invoked: self.state.invoked,
            failures: self.state.failures,
        };
        if summary.failures > 0 && !self.state.options.quiet {
            return Err(MergeIndexError::ToolFailed {
                exit: self.state.last_failure,
            });
        }
        tracing::info!(invoked = summary.invoked, failures = summary.failures, "run complete");
        Ok(summary)
    }

    /// Build, map and run one group starting at `pos`. Returns the number of
    /// records the group spans.
    fn merge_entry(&mut self, pos: usize, path: &IndexPath) -> Result<usize, MergeIndexError> {
        let (group, consumed) = build_group(self.index.entries(), pos, path)?;
        if group.is_empty() {
            tracing::debug!(%path, "no conflict stages, nothing to merge");
            return Ok(consumed);
        }

        let args = MergeArgs::new(&self.program, &group);
        tracing::debug!(%path, sides = group.len(), "invoking merge program");
        let outcome = self.runner.run(&args);
        self.state.invoked += 1;
        self.apply_policy(path, outcome)?;
        Ok(consumed)
    }

    fn apply_policy(&mut self, path: &IndexPath, outcome: Outcome) -> Result<(), MergeIndexError> {
        match outcome {
            Outcome::Success => Ok(()),
            Outcome::LaunchFailed(cause) => Err(MergeIndexError::LaunchFailed {
                program: self.program.to_string_lossy().into_owned(),
                cause,
            }),
            Outcome::ToolFailed(exit) => {
                let RunOptions { one_shot, quiet } = self.state.options;
                if one_shot {
                    self.state.failures += 1;
                    self.state.last_failure = Some(exit);
                    tracing::warn!(
                        %path,
                        %exit,
                        failures = self.state.failures,
                        "merge program failed, continuing"
                    );
                    Ok(())
                } else if quiet {
                    Err(MergeIndexError::QuietAbort)
                } else {
                    Err(MergeIndexError::ToolFailed { exit: Some(exit) })
                }
            }
        }
    }
}
