//! Local repository inspection.
//!
//! This module provides the read-only view of the working copy that the rest of the
//! crate consumes through the [`VcsOracle`] trait, and [`GitRepo`], its `git2` backed
//! implementation.
//!
//! # Public API
//! - [`VcsOracle`]: status / diff / branch / remotes of a working copy
//! - [`GitRepo`]: git2 implementation of the oracle
//! - [`StatusEntry`]: one path with its typed status
//! - [`RemoteEntry`]: a configured remote and its URL
//!
//! # Key Features
//! - **Status reading**: git2 flags become typed [`GitStatus`] entries, staged and unstaged
//! - **Rename detection**: both index and worktree renames report their source path
//! - **Diffs**: HEAD-to-working-copy patch text per path, for display

use crate::core::{
    error::{GitSyncerError, Result},
    git_status::GitStatus,
};
use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, StatusOptions};
use std::path::{Path, PathBuf};

/// One path reported by the status oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: GitStatus,
    pub path: PathBuf,
    /// Source path when `status` is `Renamed`.
    pub from: Option<PathBuf>,
    pub staged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub url: String,
}

/// Read-only questions the sync run asks about the local working copy
pub trait VcsOracle {
    /// Every changed path, staged entries before unstaged ones
    fn status(&self) -> Result<Vec<StatusEntry>>;

    /// Patch text between HEAD and the working copy for one path
    fn diff(&self, path: &Path) -> Result<String>;

    /// Checked-out branch name, `None` on a detached HEAD
    fn current_branch(&self) -> Result<Option<String>>;

    fn remotes(&self) -> Result<Vec<RemoteEntry>>;

    /// Root that status paths are relative to
    fn workdir(&self) -> &Path;
}

pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| GitSyncerError::NotInGitRepo)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitSyncerError::configuration("Repository has no working directory"))?
            .to_path_buf();
        Ok(GitRepo { repo, workdir })
    }

    fn rename_source(delta: Option<git2::DiffDelta<'_>>) -> Option<PathBuf> {
        delta.and_then(|d| d.old_file().path().map(Path::to_path_buf))
    }

    fn rename_target(delta: Option<git2::DiffDelta<'_>>) -> Option<PathBuf> {
        delta.and_then(|d| d.new_file().path().map(Path::to_path_buf))
    }
}

impl VcsOracle for GitRepo {
    fn status(&self) -> Result<Vec<StatusEntry>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true)
            .renames_index_to_workdir(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut staged = Vec::new();
        let mut unstaged = Vec::new();

        for entry in statuses.iter() {
            let path = entry
                .path()
                .ok_or_else(|| GitSyncerError::configuration("Invalid UTF-8 path in repository"))?;
            let flags = entry.status();

            if let Some((status, is_staged)) = GitStatus::from_git2_staged(flags) {
                let (path, from) = if status == GitStatus::Renamed {
                    (
                        Self::rename_target(entry.head_to_index())
                            .unwrap_or_else(|| PathBuf::from(path)),
                        Self::rename_source(entry.head_to_index()),
                    )
                } else {
                    (PathBuf::from(path), None)
                };
                staged.push(StatusEntry {
                    status,
                    path,
                    from,
                    staged: is_staged,
                });
            }

            // Can be in addition to a staged change. `entry.path()` is the pre-rename
            // path when the index holds a rename, so the worktree side names the file.
            if let Some((status, is_staged)) = GitStatus::from_git2_unstaged(flags) {
                let path = Self::rename_target(entry.index_to_workdir())
                    .or_else(|| Self::rename_target(entry.head_to_index()))
                    .unwrap_or_else(|| PathBuf::from(path));
                let from = if status == GitStatus::Renamed {
                    Self::rename_source(entry.index_to_workdir())
                } else {
                    None
                };
                unstaged.push(StatusEntry {
                    status,
                    path,
                    from,
                    staged: is_staged,
                });
            }
        }

        staged.sort_by(|a, b| a.path.cmp(&b.path));
        unstaged.sort_by(|a, b| a.path.cmp(&b.path));
        staged.extend(unstaged);

        log::debug!("Status oracle reported {} entries", staged.len());
        Ok(staged)
    }

    fn diff(&self, path: &Path) -> Result<String> {
        let head_tree = self.repo.head().ok().and_then(|h| h.peel_to_tree().ok());

        let mut opts = DiffOptions::new();
        opts.pathspec(path)
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(text)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) => {
                if head.is_branch() {
                    Ok(head.shorthand().map(str::to_string))
                } else {
                    Ok(None)
                }
            }
            // No commits yet: HEAD still names the branch symbolically
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remotes(&self) -> Result<Vec<RemoteEntry>> {
        let mut remotes = Vec::new();
        for name in self.repo.remotes()?.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            if let Some(url) = remote.url() {
                remotes.push(RemoteEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
        }
        Ok(remotes)
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}
