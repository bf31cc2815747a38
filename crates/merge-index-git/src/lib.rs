//! Index access layer for merge-index.
//!
//! This crate defines the [`GitRepo`] trait, the single interface through
//! which the merge-index driver reads the repository. Nothing outside this
//! crate imports gix directly; callers depend on `merge-index-git` and program
//! against the trait.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`index`]: [`IndexSnapshot`], the sorted view the driver scans.
//! - [`types`]: value types used in trait signatures ([`GitOid`], [`Stage`],
//!   [`IndexPath`], [`IndexEntry`]).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod index;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod gix_repo;
mod index_impl;

pub use gix_repo::GixRepo;

pub use error::GitError;
pub use index::IndexSnapshot;
pub use repo::GitRepo;
pub use types::{GitOid, IndexEntry, IndexPath, OidParseError, Stage};
