//! Property tests for the bulk scan.
//!
//! For any well-formed index the bulk scan must invoke the merge program
//! exactly once per path that has at least one conflict stage, in index
//! order, and never for a path that only exists at stage 0.

use std::collections::BTreeMap;
use std::ffi::OsStr;

use proptest::prelude::*;

use merge_index_git::{IndexSnapshot, Stage};

use super::tests::{entry, FakeRepo, RecordingRunner};
use super::{Controller, RunOptions};

/// Per path: either resolved, or a non-empty subset of stages 1..=3 encoded
/// as a 3-bit mask.
fn arb_index() -> impl Strategy<Value = BTreeMap<String, u8>> {
    prop::collection::btree_map("[a-c]{1,2}(/[a-c]{1,2})?", 0u8..8, 0..24)
}

fn build(paths: &BTreeMap<String, u8>) -> IndexSnapshot {
    let mut entries = Vec::new();
    for (path, mask) in paths {
        if *mask == 0 {
            entries.push(entry(path, Stage::Resolved));
            continue;
        }
        for (bit, stage) in Stage::CONFLICT.into_iter().enumerate() {
            if mask & (1 << bit) != 0 {
                entries.push(entry(path, stage));
            }
        }
    }
    IndexSnapshot::from_entries(entries).unwrap()
}

proptest! {
    #[test]
    fn prop_bulk_invokes_once_per_conflicted_path(paths in arb_index()) {
        let index = build(&paths);
        let repo = FakeRepo::default();
        let mut runner = RecordingRunner::default();

        let mut ctl = Controller::new(&index, &repo, &mut runner, "m", RunOptions::default());
        ctl.merge_all().unwrap();
        let summary = ctl.finish().unwrap();

        let expected: Vec<&str> = paths
            .iter()
            .filter(|(_, mask)| **mask != 0)
            .map(|(path, _)| path.as_str())
            .collect();
        let invoked: Vec<&OsStr> = runner.calls.iter().map(|a| a.path()).collect();
        prop_assert_eq!(summary.invoked, expected.len());
        prop_assert_eq!(invoked, expected);
    }

    #[test]
    fn prop_slots_match_present_stages(paths in arb_index()) {
        let index = build(&paths);
        let repo = FakeRepo::default();
        let mut runner = RecordingRunner::default();

        let mut ctl = Controller::new(&index, &repo, &mut runner, "m", RunOptions::default());
        ctl.merge_all().unwrap();

        for args in &runner.calls {
            let mask = paths[args.path().to_str().unwrap()];
            for (bit, stage) in Stage::CONFLICT.into_iter().enumerate() {
                let present = mask & (1 << bit) != 0;
                let oid = args.oid(stage).unwrap();
                let mode = args.mode(stage).unwrap();
                prop_assert_eq!(!oid.is_empty(), present);
                prop_assert_eq!(mode.is_empty(), !present);
            }
        }
    }

    #[test]
    fn prop_one_shot_counts_all_failures(paths in arb_index()) {
        let index = build(&paths);
        let repo = FakeRepo::default();
        let conflicted = paths.values().filter(|m| **m != 0).count();
        let mut runner = RecordingRunner {
            script: std::iter::repeat_n(
                crate::invoke::Outcome::ToolFailed(crate::invoke::ExitInfo::code(2)),
                conflicted,
            )
            .collect(),
            ..RecordingRunner::default()
        };
        let options = RunOptions { one_shot: true, quiet: true };

        let mut ctl = Controller::new(&index, &repo, &mut runner, "m", options);
        ctl.merge_all().unwrap();
        let summary = ctl.finish().unwrap();
        prop_assert_eq!(summary.failures as usize, conflicted);
    }
}
