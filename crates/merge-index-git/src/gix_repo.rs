//! The gix-backed implementation of [`GitRepo`].

use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::index::IndexSnapshot;
use crate::repo::GitRepo;
use crate::types::{IndexEntry, IndexPath};

/// A [`GitRepo`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepo::discover`] or [`GixRepo::open_at`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    git_dir: PathBuf,
}

impl GixRepo {
    /// Open the git repository at or above `path`.
    ///
    /// Honors `GIT_DIR` and the other environment overrides git itself
    /// respects, so the tool behaves when run from hooks and scripts.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = gix::ThreadSafeRepository::discover_with_environment_overrides(path)
            .map_err(|e| GitError::NotFound {
                message: format!("git repository at or above {}: {e}", path.display()),
            })?
            .to_thread_local();
        Ok(Self::from_repo(repo))
    }

    /// Open a git repository at exactly `path` (no parent discovery).
    pub fn open_at(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open_opts(path, gix::open::Options::isolated())
            .map_err(|e| GitError::BackendError { message: e.to_string() })?;
        Ok(Self::from_repo(repo))
    }

    fn from_repo(repo: gix::Repository) -> Self {
        let git_dir = repo.git_dir().to_path_buf();
        Self { repo, git_dir }
    }
}

impl GitRepo for GixRepo {
    fn read_index(&self) -> Result<IndexSnapshot, GitError> {
        crate::index_impl::read_index(self)
    }

    fn sparse_dir_contains(&self, dir: &IndexEntry, path: &IndexPath) -> Result<bool, GitError> {
        crate::index_impl::sparse_dir_contains(self, dir, path)
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}
