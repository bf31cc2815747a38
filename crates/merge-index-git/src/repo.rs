//! The [`GitRepo`] trait: the abstraction boundary between merge-index and git.
//!
//! The driver reads the index exactly once per run and never writes it, so
//! the surface is small:
//!
//! | Method                | Replaces                                   |
//! |-----------------------|--------------------------------------------|
//! | `read_index`          | `repo_read_index` without full expansion   |
//! | `sparse_dir_contains` | on-demand expansion of one sparse directory |
//! | `git_dir`             | locating per-repository settings files     |

use std::path::Path;

use crate::error::GitError;
use crate::index::IndexSnapshot;
use crate::types::{IndexEntry, IndexPath};

/// The git abstraction trait used by the merge-index driver.
///
/// Implementations may be backed by gix or by a test double. The trait is
/// object-safe; callers may hold a `&dyn GitRepo`.
pub trait GitRepo {
    /// Load the repository index as a sorted snapshot.
    ///
    /// Sparse-directory placeholders are returned as-is (stage 0, flagged
    /// with [`IndexEntry::sparse_dir`]); the index is never expanded. A
    /// repository without an index file yields an empty snapshot.
    fn read_index(&self) -> Result<IndexSnapshot, GitError>;

    /// Whether `path` exists inside the collapsed tree behind the
    /// sparse-directory placeholder `dir`.
    ///
    /// `path` is repository-relative and must start with `dir.path`.
    fn sparse_dir_contains(&self, dir: &IndexEntry, path: &IndexPath) -> Result<bool, GitError>;

    /// The repository's git directory (e.g. `.git`).
    fn git_dir(&self) -> &Path;
}
