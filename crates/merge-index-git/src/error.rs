//! Error types for index access.
//!
//! [`GitError`] is the single error type returned by all [`GitRepo`](crate::GitRepo) trait
//! methods. Variants are specific enough that callers can tell an unreadable
//! repository from a corrupt index without parsing messages.

use thiserror::Error;

/// Errors returned by [`GitRepo`](crate::GitRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A requested object or path was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// An object id had the wrong width or was not valid hex.
    #[error("invalid OID `{value}`: {reason}")]
    InvalidOid {
        /// The raw value that failed validation.
        value: String,
        /// Why validation failed.
        reason: String,
    },

    /// The index violates an ordering or uniqueness invariant.
    #[error("invalid index entry `{path}`: {reason}")]
    InvalidIndex {
        /// Path of the offending entry.
        path: String,
        /// Which invariant was broken.
        reason: String,
    },

    /// An I/O error occurred while reading repository files.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying git backend returned an unclassified error.
    ///
    /// The `message` should include enough context to diagnose the failure.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}
