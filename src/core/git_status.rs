//! Type-safe git file status enumeration.
//!
//! This module defines [`GitStatus`], the typed view of git2 status flags used by the
//! local status oracle, and [`ChangeKind`], the bucket a status lands in once the
//! classifier turns it into a change set.
//!
//! # Public API
//! - [`GitStatus`]: Status of one working-copy path, staged or not
//! - [`ChangeKind`]: Modified / added / deleted / renamed bucket

use serde::{Deserialize, Serialize};
use std::fmt;

/// Git file status enum derived from git2 flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GitStatus {
    /// Modified file (M)
    Modified,
    /// Added/new file in index (A)
    Added,
    /// Deleted file (D)
    Deleted,
    /// Renamed file (R)
    Renamed,
    /// Type changed (T)
    TypeChanged,
    /// Untracked file (??)
    Untracked,
    /// Unmerged/conflicted file (UU)
    Unmerged,
}

/// Which set of the change set a status contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Modified,
    Added,
    Renamed,
    Deleted,
}

impl GitStatus {
    /// Convert index-side git2 flags. Returns the status and `true` for staged.
    pub fn from_git2_staged(flags: git2::Status) -> Option<(GitStatus, bool)> {
        if flags.contains(git2::Status::INDEX_NEW) {
            return Some((GitStatus::Added, true));
        }
        if flags.contains(git2::Status::INDEX_MODIFIED) {
            return Some((GitStatus::Modified, true));
        }
        if flags.contains(git2::Status::INDEX_DELETED) {
            return Some((GitStatus::Deleted, true));
        }
        if flags.contains(git2::Status::INDEX_RENAMED) {
            return Some((GitStatus::Renamed, true));
        }
        if flags.contains(git2::Status::INDEX_TYPECHANGE) {
            return Some((GitStatus::TypeChanged, true));
        }

        None
    }

    /// Convert worktree-side git2 flags. The staged flag is always `false`.
    pub fn from_git2_unstaged(flags: git2::Status) -> Option<(GitStatus, bool)> {
        // Conflicts win over anything else in the worktree
        if flags.contains(git2::Status::CONFLICTED) {
            return Some((GitStatus::Unmerged, false));
        }

        if flags.contains(git2::Status::WT_NEW) {
            return Some((GitStatus::Untracked, false));
        }
        if flags.contains(git2::Status::WT_MODIFIED) {
            return Some((GitStatus::Modified, false));
        }
        if flags.contains(git2::Status::WT_DELETED) {
            return Some((GitStatus::Deleted, false));
        }
        if flags.contains(git2::Status::WT_RENAMED) {
            return Some((GitStatus::Renamed, false));
        }
        if flags.contains(git2::Status::WT_TYPECHANGE) {
            return Some((GitStatus::TypeChanged, false));
        }

        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GitStatus::Modified => "M",
            GitStatus::Added => "A",
            GitStatus::Deleted => "D",
            GitStatus::Renamed => "R",
            GitStatus::TypeChanged => "T",
            GitStatus::Untracked => "??",
            GitStatus::Unmerged => "UU",
        }
    }

    /// Change-set bucket for this status; `None` for conflicts, which cannot be synced
    pub fn change_kind(&self) -> Option<ChangeKind> {
        match self {
            GitStatus::Modified | GitStatus::TypeChanged => Some(ChangeKind::Modified),
            GitStatus::Added | GitStatus::Untracked => Some(ChangeKind::Added),
            GitStatus::Deleted => Some(ChangeKind::Deleted),
            GitStatus::Renamed => Some(ChangeKind::Renamed),
            GitStatus::Unmerged => None,
        }
    }
}

impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Modified => "modified",
            ChangeKind::Added => "added",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Deleted => "deleted",
        }
    }
}
