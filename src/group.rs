//! Grouping of adjacent index records into per-path conflict groups.
//!
//! The index keeps every record of a path next to each other, ordered by
//! stage, so one forward scan from the first record of a path collects all
//! of its conflict sides. The scan also reports how many records it
//! consumed, letting the bulk walk skip the whole run in one step.

use merge_index_git::{IndexEntry, IndexPath, Stage};

use crate::error::MergeIndexError;

/// The conflict sides of a single path.
///
/// `sides[0..3]` hold stages 1, 2 and 3. A missing side is `None`; it still
/// occupies its slot so positional meaning is preserved downstream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictGroup {
    /// Repository-relative path shared by every side.
    pub path: IndexPath,
    /// Records for stages 1..=3, indexed by `stage - 1`.
    pub sides: [Option<IndexEntry>; 3],
}

impl ConflictGroup {
    /// Start an empty group for `path`.
    #[must_use]
    pub fn new(path: impl Into<IndexPath>) -> Self {
        Self {
            path: path.into(),
            sides: [None, None, None],
        }
    }

    /// The record for a conflict stage, if present.
    ///
    /// Always `None` for [`Stage::Resolved`].
    #[must_use]
    pub fn side(&self, stage: Stage) -> Option<&IndexEntry> {
        slot(stage).and_then(|i| self.sides[i].as_ref())
    }

    /// `true` when no conflict side was collected, i.e. the path is already
    /// resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sides.iter().all(Option::is_none)
    }

    /// Number of conflict sides present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sides.iter().filter(|s| s.is_some()).count()
    }

    fn insert(&mut self, entry: &IndexEntry) {
        if let Some(i) = slot(entry.stage) {
            self.sides[i] = Some(entry.clone());
        }
    }
}

const fn slot(stage: Stage) -> Option<usize> {
    match stage {
        Stage::Resolved => None,
        Stage::Base => Some(0),
        Stage::Ours => Some(1),
        Stage::Theirs => Some(2),
    }
}

/// Collect the conflict group for `path` starting at `pos`.
///
/// Scans forward while records share `path`, keeping every record with a
/// nonzero stage. Returns the group and the number of records consumed.
///
/// # Errors
/// Returns [`MergeIndexError::PathNotIndexed`] when `pos` is past the end of
/// `entries` or the record at `pos` belongs to another path.
pub fn build_group(
    entries: &[IndexEntry],
    pos: usize,
    path: &IndexPath,
) -> Result<(ConflictGroup, usize), MergeIndexError> {
    let not_indexed = || MergeIndexError::PathNotIndexed { path: path.clone() };

    let run = entries.get(pos..).ok_or_else(not_indexed)?;
    let consumed = run.iter().take_while(|e| e.path == *path).count();
    if consumed == 0 {
        return Err(not_indexed());
    }

    let mut group = ConflictGroup::new(path.clone());
    for entry in &run[..consumed] {
        group.insert(entry);
    }
    Ok((group, consumed))
}
