//! The positional argument vector handed to the merge program.
//!
//! Layout, as seen by the child (`argv[0]` first):
//!
//! | slot | content                                   |
//! |------|-------------------------------------------|
//! | 0    | merge program                             |
//! | 1..3 | hex object id of stage 1..3, or `""`      |
//! | 4    | path                                      |
//! | 5..7 | octal mode of stage 1..3, or `""`         |
//!
//! Existing merge scripts (e.g. `git-merge-one-file`) read these by
//! position, so an absent stage must still fill its slots with empty
//! strings. The path slot carries the index bytes unchanged.

use std::ffi::{OsStr, OsString};

use merge_index_git::Stage;

use crate::group::ConflictGroup;

/// Number of slots, program included.
pub const SLOTS: usize = 8;

const PATH_SLOT: usize = 4;

/// A fully built argument vector for one conflicted path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeArgs([OsString; SLOTS]);

impl MergeArgs {
    /// Build the vector for `group`.
    ///
    /// Object ids were width-checked when the index was read, so every
    /// present side renders to 40 or 64 hex characters.
    #[must_use]
    pub fn new(program: impl AsRef<OsStr>, group: &ConflictGroup) -> Self {
        let mut slots: [OsString; SLOTS] = Default::default();
        slots[0] = program.as_ref().to_owned();
        slots[PATH_SLOT] = group.path.to_os_string();

        for (i, stage) in Stage::CONFLICT.into_iter().enumerate() {
            if let Some(entry) = group.side(stage) {
                slots[1 + i] = entry.oid.to_string().into();
                slots[PATH_SLOT + 1 + i] = format!("{:o}", entry.mode).into();
            }
        }

        Self(slots)
    }

    /// Slot 0: the merge program.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.0[0]
    }

    /// Slot 4: the conflicted path.
    #[must_use]
    pub fn path(&self) -> &OsStr {
        &self.0[PATH_SLOT]
    }

    /// Hex object id slot for a conflict stage (`""` when absent).
    #[must_use]
    pub fn oid(&self, stage: Stage) -> Option<&str> {
        self.ascii_slot(stage, 0)
    }

    /// Octal mode slot for a conflict stage (`""` when absent).
    #[must_use]
    pub fn mode(&self, stage: Stage) -> Option<&str> {
        self.ascii_slot(stage, PATH_SLOT)
    }

    /// All slots, program first.
    #[must_use]
    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }

    /// Slots 1..=7, the arguments after the program name.
    #[must_use]
    pub fn child_args(&self) -> &[OsString] {
        &self.0[1..]
    }

    fn ascii_slot(&self, stage: Stage, base: usize) -> Option<&str> {
        if !stage.is_conflict() {
            return None;
        }
        self.0[base + usize::from(stage.as_u8())].to_str()
    }
}
