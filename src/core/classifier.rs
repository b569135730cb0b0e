//! Change classification.
//!
//! Turns the status oracle's snapshot plus the working-copy files into the
//! [`LocalChangeSet`] the overlay engine consumes.
//!
//! A path reported more than once (staged and unstaged) lands in exactly one set,
//! chosen by [`ChangeKind`] precedence: deleted, then renamed, then added, then
//! modified. Content is read from disk for everything that gets uploaded.

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::{
    error::{GitSyncerError, Result},
    git::VcsOracle,
    git_status::{ChangeKind, GitStatus},
    model::{BlobEncoding, FileChange, LocalChangeSet, RenamedPath},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// Record added and untracked paths. When off the added set is always empty.
    pub include_added: bool,
    /// Only look at changes recorded in the index.
    pub staged_only: bool,
    /// Keep per-path diffs for display.
    pub collect_diffs: bool,
    /// `Utf8` refuses files that are not valid UTF-8.
    pub encoding: BlobEncoding,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            include_added: true,
            staged_only: false,
            collect_diffs: false,
            encoding: BlobEncoding::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NoChanges,
    Changes(LocalChangeSet),
}

struct Pending {
    kind: ChangeKind,
    from: Option<String>,
}

/// Repository-relative path in the `/`-separated form tree listings use
pub fn tree_path(path: &Path) -> Result<String> {
    let text = path
        .to_str()
        .ok_or_else(|| GitSyncerError::local_read(path, "path is not valid UTF-8"))?;
    Ok(text.replace('\\', "/"))
}

fn read_content(workdir: &Path, path: &str, encoding: BlobEncoding) -> Result<Vec<u8>> {
    let content =
        std::fs::read(workdir.join(path)).map_err(|e| GitSyncerError::local_read(path, e))?;

    if encoding == BlobEncoding::Utf8 && std::str::from_utf8(&content).is_err() {
        return Err(GitSyncerError::local_read(
            path,
            "content is not valid UTF-8; use the base64 or auto encoding",
        ));
    }
    Ok(content)
}

pub fn classify(oracle: &dyn VcsOracle, options: &ClassifierOptions) -> Result<Classification> {
    let mut pending: BTreeMap<String, Pending> = BTreeMap::new();

    for entry in oracle.status()? {
        if options.staged_only && !entry.staged {
            continue;
        }

        let path = tree_path(&entry.path)?;
        let kind = match entry.status.change_kind() {
            Some(kind) => kind,
            None => {
                return Err(GitSyncerError::configuration(format!(
                    "Unresolved conflict in '{path}'"
                )))
            }
        };

        if kind == ChangeKind::Added && !options.include_added {
            log::debug!("Skipping added path {path}");
            continue;
        }

        let from = match (&entry.status, &entry.from) {
            (GitStatus::Renamed, Some(from)) => Some(tree_path(from)?),
            _ => None,
        };
        // A rename without a known source degrades to an upload of the new path
        let kind = if kind == ChangeKind::Renamed && from.is_none() {
            ChangeKind::Modified
        } else {
            kind
        };

        // A deleted rename target takes its source down with it
        let carried = pending.get(&path).and_then(|p| p.from.clone());
        match pending.get(&path) {
            Some(existing) if existing.kind >= kind => {}
            _ => {
                let from = from.or(carried);
                pending.insert(path, Pending { kind, from });
            }
        }
    }

    let workdir = oracle.workdir();
    let mut changes = LocalChangeSet::default();

    for (path, item) in pending {
        match item.kind {
            ChangeKind::Deleted => {
                if let Some(from) = item.from.clone() {
                    changes.deleted.push(from);
                }
                changes.deleted.push(path.clone());
            }
            ChangeKind::Modified => {
                let content = read_content(workdir, &path, options.encoding)?;
                changes.modified.push(FileChange {
                    path: path.clone(),
                    content,
                });
            }
            ChangeKind::Added => {
                let content = read_content(workdir, &path, options.encoding)?;
                changes.added.push(FileChange {
                    path: path.clone(),
                    content,
                });
            }
            ChangeKind::Renamed => {
                let content = read_content(workdir, &path, options.encoding)?;
                changes.renamed.push(RenamedPath {
                    from: item.from.unwrap_or_default(),
                    to: path.clone(),
                    content,
                });
            }
        }

        if options.collect_diffs && item.kind != ChangeKind::Deleted {
            match oracle.diff(Path::new(&path)) {
                Ok(diff) => {
                    changes.diffs.insert(path, diff);
                }
                Err(e) => log::warn!("Could not diff {path}: {e}"),
            }
        }
    }

    if changes.is_empty() {
        log::debug!("Classifier found nothing to sync");
        return Ok(Classification::NoChanges);
    }

    log::debug!(
        "Classified {} modified, {} added, {} deleted, {} renamed",
        changes.modified.len(),
        changes.added.len(),
        changes.deleted.len(),
        changes.renamed.len()
    );
    Ok(Classification::Changes(changes))
}
