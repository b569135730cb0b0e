//! Tree overlay engine.
//!
//! Builds the new remote tree as the parent's tree with exactly the locally changed
//! paths laid over it. Untouched entries are carried forward as-is (same mode, same
//! hash) and only touched paths cost a blob upload.
//!
//! Application order: modified and added paths are upserted, then deletions are
//! applied, then renames (drop `from`, upsert `to`). Deleting an absent path is a no-op,
//! and a rename source that is also upserted keeps its upserted entry.

use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::{
    error::{GitSyncerError, Result},
    model::{
        BlobEncoding, EntryType, LocalChangeSet, ObjectId, OverlayedTree, RemoteTreeEntry,
        RenameMode, RepositoryCoordinates,
    },
    remote::{blob_hash, RemoteObjectStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayOptions {
    pub rename_mode: RenameMode,
    pub encoding: BlobEncoding,
    /// Blob uploads in flight at once
    pub upload_concurrency: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            rename_mode: RenameMode::Reupload,
            encoding: BlobEncoding::Auto,
            upload_concurrency: 4,
        }
    }
}

/// Path-keyed working copy of a tree listing
#[derive(Debug, Clone)]
pub struct TreeOverlay {
    base_tree: ObjectId,
    base: BTreeMap<String, RemoteTreeEntry>,
    entries: BTreeMap<String, RemoteTreeEntry>,
    uploaded_blobs: usize,
}

impl TreeOverlay {
    pub fn new(base_tree: ObjectId, listing: Vec<RemoteTreeEntry>) -> Self {
        let base: BTreeMap<String, RemoteTreeEntry> = listing
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        Self {
            base_tree,
            entries: base.clone(),
            base,
            uploaded_blobs: 0,
        }
    }

    pub fn get(&self, path: &str) -> Option<&RemoteTreeEntry> {
        self.entries.get(path)
    }

    /// Entry at `path` in the tree the overlay started from
    pub fn base_entry(&self, path: &str) -> Option<&RemoteTreeEntry> {
        self.base.get(path)
    }

    /// Point `path` at a freshly uploaded blob, replacing whatever was there
    pub fn upsert_blob(&mut self, path: &str, sha: ObjectId) {
        self.uploaded_blobs += 1;
        self.insert(RemoteTreeEntry::blob(path, sha));
    }

    pub fn insert(&mut self, entry: RemoteTreeEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Drop `path`; absent paths are ignored
    pub fn remove(&mut self, path: &str) -> Option<RemoteTreeEntry> {
        self.entries.remove(path)
    }

    pub fn finish(self) -> OverlayedTree {
        let removed = self
            .base
            .into_values()
            .filter(|entry| !self.entries.contains_key(&entry.path))
            .collect();

        OverlayedTree {
            base_tree: self.base_tree,
            entries: self.entries.into_values().collect(),
            removed,
            uploaded_blobs: self.uploaded_blobs,
        }
    }
}

/// Rename target resolved to either an existing blob or a pending upload
enum RenameSource {
    Reuse(RemoteTreeEntry),
    Upload,
}

fn rename_source(
    overlay: &TreeOverlay,
    from: &str,
    content: &[u8],
    mode: RenameMode,
) -> Result<RenameSource> {
    if mode != RenameMode::ReuseBlob {
        return Ok(RenameSource::Upload);
    }
    match overlay.base_entry(from) {
        Some(entry) if entry.entry_type == EntryType::Blob && blob_hash(content)? == entry.sha => {
            Ok(RenameSource::Reuse(entry.clone()))
        }
        _ => Ok(RenameSource::Upload),
    }
}

/// Upload blobs with bounded concurrency; results come back in input order
async fn upload_blobs(
    store: &dyn RemoteObjectStore,
    coords: &RepositoryCoordinates,
    uploads: Vec<(&str, &[u8])>,
    options: &OverlayOptions,
) -> Result<BTreeMap<String, ObjectId>> {
    let encoding = options.encoding;
    let uploaded: Vec<(String, ObjectId)> = stream::iter(uploads)
        .map(|(path, content)| async move {
            let sha = store.create_blob(coords, content, encoding).await?;
            log::debug!("Uploaded {path} as blob {}", sha.short());
            Ok::<_, GitSyncerError>((path.to_string(), sha))
        })
        .buffered(options.upload_concurrency.max(1))
        .try_collect()
        .await?;

    Ok(uploaded.into_iter().collect())
}

/// Overlay `changes` onto the listing of `base_tree`, uploading blobs as needed
pub async fn build_overlay(
    store: &dyn RemoteObjectStore,
    coords: &RepositoryCoordinates,
    base_tree: &ObjectId,
    changes: &LocalChangeSet,
    options: &OverlayOptions,
) -> Result<OverlayedTree> {
    let listing = store.get_tree(coords, base_tree).await?;
    log::debug!(
        "Base tree {} has {} entries",
        base_tree.short(),
        listing.len()
    );
    let mut overlay = TreeOverlay::new(base_tree.clone(), listing);

    let mut renames = Vec::with_capacity(changes.renamed.len());
    for rename in &changes.renamed {
        let source = rename_source(&overlay, &rename.from, &rename.content, options.rename_mode)?;
        renames.push((rename, source));
    }

    let uploads: Vec<(&str, &[u8])> = changes
        .modified
        .iter()
        .chain(changes.added.iter())
        .map(|c| (c.path.as_str(), c.content.as_slice()))
        .chain(renames.iter().filter_map(|(rename, source)| match source {
            RenameSource::Upload => Some((rename.to.as_str(), rename.content.as_slice())),
            RenameSource::Reuse(_) => None,
        }))
        .collect();
    let blobs = upload_blobs(store, coords, uploads, options).await?;

    let blob_for = |path: &str| {
        blobs
            .get(path)
            .cloned()
            .ok_or_else(|| GitSyncerError::upload(format!("no blob was created for {path}")))
    };

    for change in changes.modified.iter().chain(changes.added.iter()) {
        overlay.upsert_blob(&change.path, blob_for(&change.path)?);
    }

    for path in &changes.deleted {
        if overlay.remove(path).is_none() {
            log::debug!("{path} is already absent from the remote tree");
        }
    }

    // A rename source that was recreated locally keeps its new content
    let upserted: BTreeSet<&str> = changes
        .modified
        .iter()
        .chain(changes.added.iter())
        .map(|c| c.path.as_str())
        .collect();

    for (rename, source) in renames {
        if !upserted.contains(rename.from.as_str()) {
            overlay.remove(&rename.from);
        }
        match source {
            RenameSource::Reuse(entry) => {
                log::debug!("Reusing blob {} for {}", entry.sha.short(), rename.to);
                overlay.insert(RemoteTreeEntry {
                    path: rename.to.clone(),
                    ..entry
                });
            }
            RenameSource::Upload => overlay.upsert_blob(&rename.to, blob_for(&rename.to)?),
        }
    }

    Ok(overlay.finish())
}

/// Build the overlay and create it on the remote, anchored on `base_tree`
pub async fn apply_overlay(
    store: &dyn RemoteObjectStore,
    coords: &RepositoryCoordinates,
    base_tree: &ObjectId,
    changes: &LocalChangeSet,
    options: &OverlayOptions,
) -> Result<(OverlayedTree, ObjectId)> {
    let overlay = build_overlay(store, coords, base_tree, changes, options).await?;
    let tree = store.create_tree(coords, &overlay).await?;
    log::debug!(
        "Created tree {} ({} entries, {} removed, {} new blobs)",
        tree.short(),
        overlay.entries.len(),
        overlay.removed.len(),
        overlay.uploaded_blobs
    );
    Ok((overlay, tree))
}
