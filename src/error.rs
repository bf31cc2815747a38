//! Error types for merge-index runs.
//!
//! Defines [`MergeIndexError`], the error type for every operation of the
//! run controller. Each variant maps to a fixed process exit status via
//! [`MergeIndexError::exit_code`], so the binary never has to inspect
//! messages to decide how to terminate.

use std::path::PathBuf;

use merge_index_git::{GitError, IndexPath};
use thiserror::Error;

use crate::invoke::ExitInfo;

/// Exit status for fatal errors that print a diagnostic.
pub const EXIT_FATAL: u8 = 128;

/// Exit status for usage errors.
pub const EXIT_USAGE: u8 = 129;

/// Exit status for the silent abort under `-q` without `-o`.
pub const EXIT_QUIET_ABORT: u8 = 1;

/// Errors raised while driving the merge program over the index.
#[derive(Debug, Error)]
pub enum MergeIndexError {
    /// Bad flags or arguments.
    #[error("{0}")]
    Usage(String),

    /// An explicitly named path has no record in the index at all.
    #[error("{path} not in the cache")]
    PathNotIndexed {
        /// The path as given on the command line.
        path: IndexPath,
    },

    /// The merge program could not be started.
    #[error("failed to run merge program `{program}`: {cause}")]
    LaunchFailed {
        /// Program as passed on the command line (after alias resolution).
        program: String,
        /// Why the launch failed.
        cause: String,
    },

    /// The merge program ran and reported failure.
    ///
    /// Raised for the first failure when running without `-o`, and for the
    /// aggregate report at the end of a `-o` run.
    #[error("merge program failed")]
    ToolFailed {
        /// Exit details of the last failing invocation, if any.
        exit: Option<ExitInfo>,
    },

    /// The merge program failed under `-q` without `-o`: stop at once,
    /// print nothing.
    #[error("merge program failed (quiet)")]
    QuietAbort,

    /// The index could not be read.
    #[error(transparent)]
    Index(#[from] GitError),

    /// `merge-index.toml` exists but could not be read or parsed.
    #[error("invalid config {}: {message}", path.display())]
    Config {
        /// Config file location.
        path: PathBuf,
        /// Parser or I/O message.
        message: String,
    },
}

impl MergeIndexError {
    /// The process exit status this error terminates with.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::QuietAbort => EXIT_QUIET_ABORT,
            Self::PathNotIndexed { .. }
            | Self::LaunchFailed { .. }
            | Self::ToolFailed { .. }
            | Self::Index(_)
            | Self::Config { .. } => EXIT_FATAL,
        }
    }

    /// Whether a diagnostic should be printed before exiting.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::QuietAbort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_abort_is_silent_with_status_one() {
        let err = MergeIndexError::QuietAbort;
        assert!(err.is_silent());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn fatal_errors_share_one_status() {
        let errs = [
            MergeIndexError::PathNotIndexed { path: "c".into() },
            MergeIndexError::ToolFailed { exit: None },
            MergeIndexError::LaunchFailed {
                program: "nope".into(),
                cause: "not found".into(),
            },
        ];
        for err in errs {
            assert!(!err.is_silent());
            assert_eq!(err.exit_code(), EXIT_FATAL);
        }
    }

    #[test]
    fn usage_error_status() {
        assert_eq!(MergeIndexError::Usage("x".into()).exit_code(), EXIT_USAGE);
    }

    #[test]
    fn not_in_cache_message() {
        let err = MergeIndexError::PathNotIndexed { path: "dir/file".into() };
        assert_eq!(err.to_string(), "dir/file not in the cache");
    }
}
