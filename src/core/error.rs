//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`GitSyncerError`] which covers every way a sync run can end
//! other than success. It uses `thiserror` for ergonomic error definitions and includes
//! constructors and classification helpers so callers can branch on the failure kind.
//!
//! # Public API
//! - [`GitSyncerError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, GitSyncerError>`
//!
//! # Error Categories
//! - **Outcome**: `NoChanges` (a normal outcome, reported distinctly)
//! - **Local**: configuration gaps, unreadable files, git2 failures
//! - **Remote graph**: missing objects or refs
//! - **Concurrency**: tree conflicts and non-fast-forward ref updates
//! - **Transport**: upload failures, network errors, timeouts, auth rejections

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for git-syncer
#[derive(Error, Debug)]
pub enum GitSyncerError {
    #[error("No changes to sync")]
    NoChanges,

    #[error("Not in a git repository")]
    NotInGitRepo,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cannot read local file '{path}': {reason}")]
    LocalRead { path: PathBuf, reason: String },

    // Remote object graph
    #[error("Remote object not found: {what}")]
    ObjectNotFound { what: String },

    #[error("Branch reference not found: {branch}")]
    RefNotFound { branch: String },

    // Optimistic concurrency
    #[error("Tree conflict: base tree {base_tree} was rejected ({message})")]
    TreeConflict { base_tree: String, message: String },

    #[error("Branch '{branch}' has moved; update is not a fast-forward")]
    NonFastForward { branch: String },

    // Transport
    #[error("Upload failed: {message}")]
    Upload { message: String },

    #[error("Remote request failed: {message}")]
    Transport { message: String },

    #[error("Remote request timed out: {operation}")]
    Timeout { operation: String },

    #[error("Remote rejected credentials (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Account '{username}' is not registered")]
    UnknownAccount { username: String },

    #[error("Git repository error: {0}")]
    GitRepo(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using GitSyncerError
pub type Result<T> = std::result::Result<T, GitSyncerError>;

impl GitSyncerError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a local read error for a working-copy file
    pub fn local_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::LocalRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn object_not_found(what: impl Into<String>) -> Self {
        Self::ObjectNotFound { what: what.into() }
    }

    pub fn ref_not_found(branch: impl Into<String>) -> Self {
        Self::RefNotFound {
            branch: branch.into(),
        }
    }

    pub fn tree_conflict(base_tree: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TreeConflict {
            base_tree: base_tree.into(),
            message: message.into(),
        }
    }

    pub fn non_fast_forward(branch: impl Into<String>) -> Self {
        Self::NonFastForward {
            branch: branch.into(),
        }
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn unauthorized(status: u16, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            status,
            message: message.into(),
        }
    }

    pub fn unknown_account(username: impl Into<String>) -> Self {
        Self::UnknownAccount {
            username: username.into(),
        }
    }

    /// Transport failures that may succeed if the whole run is attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// The remote refused the credential; the caller has to re-authenticate
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Lost an optimistic-concurrency race; the caller has to rebase onto the new head
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::TreeConflict { .. } | Self::NonFastForward { .. })
    }
}
