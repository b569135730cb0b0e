//! Git Syncer - push local working-copy changes to a hosted repository as one commit.
//!
//! Instead of `git push`, the changed files are sent through the host's git-data API:
//! blobs are uploaded, a new tree is built by overlaying the changes on the branch's
//! current tree, a single-parent commit is created and the branch is fast-forwarded.
//! Paths that did not change locally keep their exact remote content.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module, which provides:
//! - Local change classification through the [`VcsOracle`] seam
//! - The [`RemoteObjectStore`] contract and its GitHub client
//! - The tree overlay engine and the [`SyncRun`] orchestrator
//! - Error handling and result types

pub mod commands;
pub mod core;

pub use crate::core::{
    classify,
    Classification,
    ClassifierOptions,
    CoordinateOverrides,
    // Remote store
    GitHubClient,
    // Local repository
    GitRepo,
    // Error handling
    GitSyncerError,
    LocalChangeSet,
    ObjectId,
    OverlayedTree,
    RemoteObjectStore,
    RemoteTreeEntry,
    RepositoryCoordinates,
    Result,
    SyncConfig,
    SyncOptions,
    SyncOutcome,
    // Orchestration
    SyncRun,
    VcsOracle,
};
