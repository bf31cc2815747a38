//! merge-index library crate.
//!
//! The primary interface is the `merge-index` binary. This lib.rs exposes
//! the run controller and its parts so integration tests can drive them
//! with an in-memory index and a recording process runner.
//!
//! Flow for one conflicted path: [`group`] collects its stages,
//! [`args`] lays them out positionally, [`invoke`] runs the merge program,
//! and [`run`] applies the failure policy to the outcome.

pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod group;
pub mod invoke;
pub mod run;
pub mod telemetry;

pub use error::MergeIndexError;
pub use run::{Controller, RunOptions, RunSummary, Target, execute};
