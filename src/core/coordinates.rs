//! Remote repository addressing.
//!
//! Resolves the [`RepositoryCoordinates`] of a run: explicit values win, anything
//! missing is derived from the local checkout (current branch, `origin` remote URL).

use crate::core::{
    error::{GitSyncerError, Result},
    git::{RemoteEntry, VcsOracle},
    model::RepositoryCoordinates,
};

const PREFERRED_REMOTE: &str = "origin";

/// Values supplied by the caller; `None` means "derive it"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateOverrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

/// Split a remote URL into `(owner, repo)`.
///
/// Accepts `https://host/owner/repo.git`, `ssh://git@host:22/owner/repo.git`,
/// scp-style `git@host:owner/repo.git` and plain paths. The repository is the final
/// path segment with `.git` stripped; the owner is the segment before it.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let url = url.trim();

    let path = if let Some((_, rest)) = url.split_once("://") {
        // Drop the authority part
        rest.split_once('/').map(|(_, p)| p)?
    } else if let Some((host, rest)) = url.split_once(':') {
        // scp-style `user@host:path`, but not a Windows drive letter
        if host.len() == 1 {
            url
        } else {
            rest
        }
    } else {
        url
    };

    let mut segments = path
        .trim_end_matches('/')
        .rsplit('/')
        .filter(|s| !s.is_empty());
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    let owner = segments.next()?;

    if repo.is_empty() || owner.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

fn pick_remote(remotes: &[RemoteEntry]) -> Option<&RemoteEntry> {
    remotes
        .iter()
        .find(|r| r.name == PREFERRED_REMOTE)
        .or_else(|| remotes.first())
}

/// Fill in whatever the caller left out from the local checkout
pub fn resolve_coordinates(
    overrides: &CoordinateOverrides,
    oracle: &dyn VcsOracle,
) -> Result<RepositoryCoordinates> {
    let branch = match &overrides.branch {
        Some(branch) if !branch.trim().is_empty() => branch.trim().to_string(),
        _ => oracle.current_branch()?.ok_or_else(|| {
            GitSyncerError::configuration("No branch name given and HEAD is detached")
        })?,
    };

    let derived = if overrides.owner.is_none() || overrides.repo.is_none() {
        let remotes = oracle.remotes()?;
        let remote = pick_remote(&remotes);
        if let Some(remote) = remote {
            log::debug!("Deriving repository identity from remote '{}'", remote.name);
        }
        remote.and_then(|r| parse_remote_url(&r.url))
    } else {
        None
    };

    let owner = overrides
        .owner
        .clone()
        .or_else(|| derived.as_ref().map(|(o, _)| o.clone()))
        .ok_or_else(|| {
            GitSyncerError::configuration(
                "Cannot determine repository owner: pass --owner or add a remote",
            )
        })?;
    let repo = overrides
        .repo
        .clone()
        .or_else(|| derived.as_ref().map(|(_, r)| r.clone()))
        .ok_or_else(|| {
            GitSyncerError::configuration(
                "Cannot determine repository name: pass --repo or add a remote",
            )
        })?;

    Ok(RepositoryCoordinates {
        owner,
        repo,
        branch,
    })
}
