//! An immutable, sorted view of the git index.
//!
//! [`IndexSnapshot`] holds entries in git's index order (path bytes, then
//! stage) and answers the two lookups the merge driver needs: the bulk
//! left-to-right scan and the exact-or-insertion-point search by path.

use crate::error::GitError;
use crate::types::{compare_key, IndexEntry, Stage};

/// A sorted, read-only sequence of index entries.
///
/// Invariants upheld by every constructor:
/// - entries are sorted by path bytes, then stage, so all records of one
///   path are adjacent;
/// - at most one entry exists per `(path, stage)` pair;
/// - sparse-directory placeholders always have stage 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    /// Build a snapshot, sorting `entries` into index order.
    ///
    /// # Errors
    /// Returns [`GitError::InvalidIndex`] on a duplicate `(path, stage)` pair
    /// or a sparse-directory placeholder with a conflict stage.
    pub fn from_entries(mut entries: Vec<IndexEntry>) -> Result<Self, GitError> {
        entries.sort_by(IndexEntry::sort_key_cmp);

        if let Some(bad) = entries.iter().find(|e| e.sparse_dir && e.stage.is_conflict()) {
            return Err(GitError::InvalidIndex {
                path: bad.path.to_string(),
                reason: format!("sparse directory entry at stage {}", bad.stage),
            });
        }
        if let Some(pair) = entries
            .windows(2)
            .find(|w| w[0].path == w[1].path && w[0].stage == w[1].stage)
        {
            return Err(GitError::InvalidIndex {
                path: pair[0].path.to_string(),
                reason: format!("duplicate entry at stage {}", pair[0].stage),
            });
        }

        Ok(Self { entries })
    }

    /// All entries in index order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locate `path` at stage 0.
    ///
    /// Returns `Ok(pos)` if a resolved entry for `path` exists. Otherwise
    /// returns `Err(pos)` where `pos` is where `(path, 0)` would be inserted,
    /// which is the first conflict entry of `path` when there is one.
    pub fn name_pos(&self, path: impl AsRef<[u8]>) -> Result<usize, usize> {
        let path = path.as_ref();
        self.entries
            .binary_search_by(|e| compare_key(e.path.as_bytes(), e.stage, path, Stage::Resolved))
    }

    /// The sparse-directory placeholder whose collapsed tree would contain
    /// `path`, if any.
    #[must_use]
    pub fn covering_sparse_dir(&self, path: impl AsRef<[u8]>) -> Option<&IndexEntry> {
        let path = path.as_ref();
        path.iter()
            .enumerate()
            .filter(|(_, b)| **b == b'/')
            .find_map(|(idx, _)| {
                let pos = self.name_pos(&path[..=idx]).ok()?;
                let entry = &self.entries[pos];
                entry.sparse_dir.then_some(entry)
            })
    }
}
