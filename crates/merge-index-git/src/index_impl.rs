//! Index read operations for [`GixRepo`].

use crate::GixRepo;
use crate::error::GitError;
use crate::index::IndexSnapshot;
use crate::types::{GitOid, IndexEntry, IndexPath, Stage};

/// Stage bits live at positions 12..=13 of the on-disk entry flags.
const STAGE_SHIFT: u32 = 12;
const STAGE_BITS: u32 = 0b11;

pub fn read_index(repo: &GixRepo) -> Result<IndexSnapshot, GitError> {
    let index = repo
        .repo
        .index_or_empty()
        .map_err(|e| GitError::BackendError {
            message: format!("failed to open index: {e}"),
        })?;
    let state: &gix::index::State = &index;

    let mut entries = Vec::with_capacity(state.entries().len());
    for entry in state.entries() {
        // Paths are raw bytes; no encoding is assumed.
        let path = IndexPath::from_bytes(entry.path(state).to_vec());

        let raw_stage = (entry.flags.bits() >> STAGE_SHIFT) & STAGE_BITS;
        #[allow(clippy::cast_possible_truncation)]
        let stage = Stage::from_raw(raw_stage as u8).map_err(|s| GitError::InvalidIndex {
            path: path.to_string(),
            reason: format!("stage {s} out of range"),
        })?;

        let oid = GitOid::from_slice(entry.id.as_bytes()).map_err(|e| GitError::InvalidOid {
            value: e.value,
            reason: e.reason,
        })?;

        entries.push(IndexEntry {
            path,
            stage,
            mode: entry.mode.bits(),
            oid,
            sparse_dir: entry.mode == gix::index::entry::Mode::DIR,
        });
    }

    tracing::debug!(entries = entries.len(), "index loaded");
    IndexSnapshot::from_entries(entries)
}

pub fn sparse_dir_contains(
    repo: &GixRepo,
    dir: &IndexEntry,
    path: &IndexPath,
) -> Result<bool, GitError> {
    let Some(rest) = path.as_bytes().strip_prefix(dir.path.as_bytes()) else {
        return Ok(false);
    };
    let start = rest.iter().position(|b| *b != b'/').unwrap_or(rest.len());
    let rest = &rest[start..];
    if rest.is_empty() {
        return Ok(false);
    }

    let id = gix::ObjectId::try_from(dir.oid.as_bytes()).map_err(|e| GitError::InvalidOid {
        value: dir.oid.to_string(),
        reason: e.to_string(),
    })?;
    let tree = repo
        .repo
        .find_object(id)
        .map_err(|e| GitError::NotFound {
            message: format!("tree {} for sparse directory {}: {e}", dir.oid, dir.path),
        })?
        .try_into_tree()
        .map_err(|e| GitError::BackendError {
            message: format!("sparse directory {} is not a tree: {e}", dir.path),
        })?;

    let found = tree
        .lookup_entry(rest.split(|b| *b == b'/'))
        .map_err(|e| GitError::BackendError {
            message: format!("failed to look up {path} in {}: {e}", dir.path),
        })?;
    Ok(found.is_some())
}
