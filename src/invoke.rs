//! Running the merge program.
//!
//! One invocation at a time, strictly blocking: the merge program may be
//! interactive and own the terminal until it exits. There is no timeout.

use std::fmt;
use std::process::{Command, ExitStatus};

use tracing::instrument;

use crate::args::MergeArgs;

/// How a merge program that did run ended unsuccessfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitInfo {
    /// Exit code, when the program exited normally.
    pub code: Option<i32>,
    /// Terminating signal, when it was killed (unix only).
    pub signal: Option<i32>,
}

impl ExitInfo {
    /// A normal exit with `code`.
    #[must_use]
    pub const fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "killed by signal {signal}"),
            (None, None) => f.write_str("unknown exit status"),
        }
    }
}

/// Result of one merge program invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The program exited with status 0.
    Success,
    /// The program ran and reported failure.
    ToolFailed(ExitInfo),
    /// The program could not be started at all.
    LaunchFailed(String),
}

/// Starts the merge program and waits for it.
///
/// Implementations must block until the child has terminated.
pub trait ProcessRunner {
    /// Run `args.program()` with `args.child_args()` and classify the result.
    fn run(&mut self, args: &MergeArgs) -> Outcome;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &mut T {
    fn run(&mut self, args: &MergeArgs) -> Outcome {
        (**self).run(args)
    }
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
///
/// stdin, stdout and stderr are inherited. If a trace context is active it
/// is exported to the child as `TRACEPARENT`.
#[derive(Debug, Default)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    #[instrument(
        skip_all,
        fields(
            program = %args.program().to_string_lossy(),
            path = %args.path().to_string_lossy()
        )
    )]
    fn run(&mut self, args: &MergeArgs) -> Outcome {
        let mut cmd = Command::new(args.program());
        cmd.args(args.child_args());
        if let Some(traceparent) = crate::telemetry::current_traceparent() {
            cmd.env("TRACEPARENT", traceparent);
        }

        match cmd.status() {
            Ok(status) if status.success() => Outcome::Success,
            Ok(status) => {
                let info = ExitInfo::from_status(status);
                tracing::debug!(%info, "merge program reported failure");
                Outcome::ToolFailed(info)
            }
            Err(e) => Outcome::LaunchFailed(e.to_string()),
        }
    }
}

/// Restore the default `SIGCHLD` disposition.
///
/// An inherited `SIG_IGN` makes the kernel reap children on its own, and
/// waiting on them then fails instead of reporting their status.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn reset_child_signal() {
    // SAFETY: called once from main before any child is spawned and before
    // any other thread exists; SIG_DFL installs no handler code.
    unsafe {
        libc::signal(libc::SIGCHLD, libc::SIG_DFL);
    }
}

/// No-op where there is no `SIGCHLD`.
#[cfg(not(unix))]
pub const fn reset_child_signal() {}
