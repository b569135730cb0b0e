//! Core functionality for the git-syncer tool.
//!
//! This module provides the building blocks of a sync run: the data model, the local
//! working-copy oracle, change classification, the remote object store and its GitHub
//! implementation, the tree overlay engine and the orchestrator tying them together.

pub mod classifier;
pub mod colors;
pub mod config;
pub mod coordinates;
pub mod dirs;
pub mod error;
pub mod git;
pub mod git_status;
pub mod github;
pub mod model;
pub mod output;
pub mod overlay;
pub mod remote;
pub mod sync;

// === Error handling ===
pub use error::{GitSyncerError, Result};

// === Data model ===
pub use model::{
    BlobEncoding, BranchRef, CommitHandle, EntryType, FileChange, FileMode, LocalChangeSet,
    ObjectId, OverlayedTree, RemoteTreeEntry, RenameMode, RenamedPath, RepositoryCoordinates,
};

// === Local repository ===
// Working-copy oracle and its git2 implementation
pub use git::{GitRepo, RemoteEntry, StatusEntry, VcsOracle};
pub use git_status::{ChangeKind, GitStatus};

// === Classification ===
pub use classifier::{classify, Classification, ClassifierOptions};
pub use coordinates::{parse_remote_url, resolve_coordinates, CoordinateOverrides};

// === Remote store ===
pub use github::{GitHubClient, GITHUB_API_BASE};
pub use remote::{blob_hash, CommitAuthor, NewCommit, RemoteObjectStore};

// === Overlay and orchestration ===
pub use overlay::{apply_overlay, build_overlay, OverlayOptions, TreeOverlay};
pub use sync::{
    AuthorIdentity, SyncOptions, SyncOutcome, SyncPhase, SyncReport, SyncRun,
    DEFAULT_COMMIT_MESSAGE,
};

// === Configuration ===
pub use config::{resolve_token, SyncConfig};

// === Output formatting ===
pub use colors::{colorize_diff_line, format_change_line, get_change_color_style};
pub use output::{print_error, print_info, print_notice, print_section_header, print_success};
