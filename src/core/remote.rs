//! Remote object store contract.
//!
//! [`RemoteObjectStore`] is the seam between the sync logic and the hosting service:
//! single-round-trip operations on blobs, trees, commits and the branch ref.
//! Implementations hold their own credential and never retry internally.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    error::{GitSyncerError, Result},
    model::{
        BlobEncoding, BranchRef, CommitHandle, ObjectId, OverlayedTree, RemoteTreeEntry,
        RepositoryCoordinates,
    },
};

/// Author line attached to created commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// Everything `create_commit` needs. A commit has exactly one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub message: String,
    pub tree: ObjectId,
    pub parent: ObjectId,
    pub author: Option<CommitAuthor>,
}

#[async_trait]
pub trait RemoteObjectStore: Send + Sync {
    /// Commit the target branch currently points at. `RefNotFound` if it does not exist.
    async fn get_branch_head(&self, coords: &RepositoryCoordinates) -> Result<BranchRef>;

    async fn get_commit(
        &self,
        coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<CommitHandle>;

    /// Full recursive listing of a tree
    async fn get_tree(
        &self,
        coords: &RepositoryCoordinates,
        tree: &ObjectId,
    ) -> Result<Vec<RemoteTreeEntry>>;

    async fn create_blob(
        &self,
        coords: &RepositoryCoordinates,
        content: &[u8],
        encoding: BlobEncoding,
    ) -> Result<ObjectId>;

    /// Create `tree.entries` anchored on `tree.base_tree`; `tree.removed` must not survive
    async fn create_tree(
        &self,
        coords: &RepositoryCoordinates,
        tree: &OverlayedTree,
    ) -> Result<ObjectId>;

    async fn create_commit(
        &self,
        coords: &RepositoryCoordinates,
        commit: &NewCommit,
    ) -> Result<CommitHandle>;

    /// Non-forced move of the branch to `commit`; `NonFastForward` if it moved meanwhile
    async fn update_branch_ref(
        &self,
        coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<BranchRef>;
}

/// Wire form of blob content: the payload and the encoding name the API expects
pub fn encode_blob(content: &[u8], encoding: BlobEncoding) -> Result<(String, &'static str)> {
    match encoding {
        BlobEncoding::Utf8 => std::str::from_utf8(content)
            .map(|text| (text.to_string(), "utf-8"))
            .map_err(|e| GitSyncerError::upload(format!("blob is not valid UTF-8: {e}"))),
        BlobEncoding::Base64 => Ok((
            base64::engine::general_purpose::STANDARD.encode(content),
            "base64",
        )),
        BlobEncoding::Auto => match std::str::from_utf8(content) {
            Ok(text) => Ok((text.to_string(), "utf-8")),
            Err(_) => encode_blob(content, BlobEncoding::Base64),
        },
    }
}

/// Git blob id of `content`, as the remote would compute it
pub fn blob_hash(content: &[u8]) -> Result<ObjectId> {
    let oid = git2::Oid::hash_object(git2::ObjectType::Blob, content)?;
    Ok(ObjectId::from(oid))
}
