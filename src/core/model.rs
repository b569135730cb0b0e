//! Data model shared by the classifier, the overlay engine and the remote client.
//!
//! # Public API
//! - [`RepositoryCoordinates`]: owner / repository / branch of the remote
//! - [`ObjectId`]: validated content hash of a remote object
//! - [`RemoteTreeEntry`]: one path of a remote tree listing
//! - [`LocalChangeSet`]: the local deltas to overlay onto the remote tree
//! - [`OverlayedTree`]: the tree about to be submitted
//! - [`CommitHandle`], [`BranchRef`]: remote commit and branch pointer
//! - [`RenameMode`], [`BlobEncoding`]: knobs for the two content-handling choices

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{GitSyncerError, Result};

/// Identity of a remote repository plus the branch a run targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryCoordinates {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepositoryCoordinates {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for RepositoryCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

/// Hex content hash of a blob, tree or commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse a hash, rejecting anything that is not a non-empty hex string
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GitSyncerError::object_not_found(format!(
                "malformed object id '{value}'"
            )));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }
}

impl TryFrom<String> for ObjectId {
    type Error = GitSyncerError;

    fn try_from(value: String) -> Result<Self> {
        ObjectId::parse(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Git file mode of a tree entry, serialized the way the object API spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    #[serde(rename = "100644")]
    Regular,
    #[serde(rename = "100755")]
    Executable,
    #[serde(rename = "120000")]
    Symlink,
    #[serde(rename = "040000")]
    Tree,
    #[serde(rename = "160000")]
    Submodule,
}

impl FileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Tree => "040000",
            FileMode::Submodule => "160000",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Blob,
    Tree,
    Commit,
}

/// One path of a remote tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTreeEntry {
    pub path: String,
    pub mode: FileMode,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub sha: ObjectId,
}

impl RemoteTreeEntry {
    /// Regular file entry pointing at a blob
    pub fn blob(path: impl Into<String>, sha: ObjectId) -> Self {
        Self {
            path: path.into(),
            mode: FileMode::Regular,
            entry_type: EntryType::Blob,
            sha,
        }
    }
}

/// A path whose current content has to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: Vec<u8>,
}

/// A rename; `content` is what now lives at `to` in the working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedPath {
    pub from: String,
    pub to: String,
    pub content: Vec<u8>,
}

/// Local deltas produced once per run by the classifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalChangeSet {
    pub modified: Vec<FileChange>,
    pub added: Vec<FileChange>,
    pub deleted: Vec<String>,
    pub renamed: Vec<RenamedPath>,
    /// Per-path textual diff, kept for display only.
    pub diffs: BTreeMap<String, String>,
}

impl LocalChangeSet {
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
            && self.added.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len() + self.renamed.len()
    }
}

/// The tree about to be submitted to `create_tree`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayedTree {
    /// Tree the overlay was computed against.
    pub base_tree: ObjectId,
    /// Full listing in path order, no duplicates.
    pub entries: Vec<RemoteTreeEntry>,
    /// Base entries that are gone from the overlay.
    pub removed: Vec<RemoteTreeEntry>,
    /// Number of blobs uploaded while building the overlay.
    pub uploaded_blobs: usize,
}

impl OverlayedTree {
    pub fn get(&self, path: &str) -> Option<&RemoteTreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }
}

/// A commit on the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHandle {
    pub sha: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
}

/// The commit a branch name currently resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub branch: String,
    pub commit: ObjectId,
}

/// How a renamed path gets its blob under the new name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenameMode {
    /// Always upload the content found at the new path.
    #[default]
    Reupload,
    /// Reuse the old blob when the local content hashes to it, upload otherwise.
    ReuseBlob,
}

/// Wire encoding used when creating blobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BlobEncoding {
    /// UTF-8 when the content is valid UTF-8, base64 otherwise.
    #[default]
    Auto,
    /// Text only; non-UTF-8 content is refused.
    Utf8,
    Base64,
}
