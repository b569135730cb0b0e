//! GitHub git-data REST API client.
//!
//! [`GitHubClient`] implements [`RemoteObjectStore`] over `reqwest`. Every call is one
//! request carrying the bearer token and the configured timeout. HTTP failures are
//! mapped per operation onto the typed errors in [`GitSyncerError`], and responses
//! are decoded into explicit structures so malformed payloads fail at the boundary.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::core::{
    error::{GitSyncerError, Result},
    model::{
        BlobEncoding, BranchRef, CommitHandle, EntryType, FileMode, ObjectId, OverlayedTree,
        RemoteTreeEntry, RepositoryCoordinates,
    },
    remote::{encode_blob, CommitAuthor, NewCommit, RemoteObjectStore},
};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("git-syncer/", env!("CARGO_PKG_VERSION"));

/// Which call failed; decides how an HTTP status is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetBranchHead,
    GetCommit,
    GetTree,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateBranchRef,
    GetUser,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetBranchHead => "get branch head",
            Operation::GetCommit => "get commit",
            Operation::GetTree => "get tree",
            Operation::CreateBlob => "create blob",
            Operation::CreateTree => "create tree",
            Operation::CreateCommit => "create commit",
            Operation::UpdateBranchRef => "update branch ref",
            Operation::GetUser => "get user",
        }
    }

    fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::CreateBlob | Operation::CreateTree | Operation::CreateCommit
        )
    }

    /// Error for a response body that did not decode
    fn malformed(&self, detail: impl std::fmt::Display) -> GitSyncerError {
        let message = format!("malformed {} response: {detail}", self.name());
        if self.is_write() {
            GitSyncerError::upload(message)
        } else {
            GitSyncerError::object_not_found(message)
        }
    }
}

/// Classify a non-success response of `op`
pub fn api_error(
    op: Operation,
    status: u16,
    message: &str,
    coords: &RepositoryCoordinates,
    subject: &str,
) -> GitSyncerError {
    if status == 401 || status == 403 {
        return GitSyncerError::unauthorized(status, message);
    }

    match (op, status) {
        (Operation::GetBranchHead, 404) => GitSyncerError::ref_not_found(&coords.branch),
        (Operation::UpdateBranchRef, 404) => GitSyncerError::ref_not_found(&coords.branch),
        (Operation::UpdateBranchRef, 422) if message.contains("does not exist") => {
            GitSyncerError::ref_not_found(&coords.branch)
        }
        (Operation::UpdateBranchRef, 409 | 422) => {
            GitSyncerError::non_fast_forward(&coords.branch)
        }
        (Operation::GetCommit | Operation::GetTree, 404 | 422) => {
            GitSyncerError::object_not_found(format!("{subject} in {coords}"))
        }
        (Operation::CreateTree, 409 | 422) => GitSyncerError::tree_conflict(subject, message),
        (Operation::CreateTree | Operation::CreateCommit, 404) => {
            GitSyncerError::object_not_found(format!("{subject} in {coords}"))
        }
        (op, status) if op.is_write() => {
            GitSyncerError::upload(format!("{} failed (HTTP {status}): {message}", op.name()))
        }
        (op, status) => GitSyncerError::transport(format!(
            "{} failed (HTTP {status}): {message}",
            op.name()
        )),
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ApiShaRef {
    sha: ObjectId,
}

#[derive(Deserialize)]
struct ApiRef {
    object: ApiShaRef,
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: ObjectId,
    tree: ApiShaRef,
    parents: Vec<ApiShaRef>,
}

impl From<ApiCommit> for CommitHandle {
    fn from(commit: ApiCommit) -> Self {
        CommitHandle {
            sha: commit.sha,
            tree: commit.tree.sha,
            parents: commit.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

#[derive(Deserialize)]
struct ApiTree {
    tree: Vec<RemoteTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Serialize)]
struct CreateBlobRequest<'a> {
    content: String,
    encoding: &'a str,
}

/// One item of a create-tree request; `sha: None` deletes the path
#[derive(Debug, Serialize, PartialEq, Eq)]
struct TreeItem<'a> {
    path: &'a str,
    mode: FileMode,
    #[serde(rename = "type")]
    entry_type: EntryType,
    sha: Option<&'a ObjectId>,
}

#[derive(Debug, Serialize)]
struct CreateTreeRequest<'a> {
    base_tree: &'a ObjectId,
    tree: Vec<TreeItem<'a>>,
}

impl<'a> CreateTreeRequest<'a> {
    /// Directory entries are left out: the server derives them from nested paths
    fn from_overlay(overlay: &'a OverlayedTree) -> Self {
        let live = overlay
            .entries
            .iter()
            .filter(|e| e.entry_type != EntryType::Tree)
            .map(|e| TreeItem {
                path: &e.path,
                mode: e.mode,
                entry_type: e.entry_type,
                sha: Some(&e.sha),
            });
        let tombstones = overlay
            .removed
            .iter()
            .filter(|e| e.entry_type != EntryType::Tree)
            .map(|e| TreeItem {
                path: &e.path,
                mode: e.mode,
                entry_type: e.entry_type,
                sha: None,
            });

        Self {
            base_tree: &overlay.base_tree,
            tree: live.chain(tombstones).collect(),
        }
    }
}

#[derive(Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a ObjectId,
    parents: [&'a ObjectId; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a CommitAuthor>,
}

#[derive(Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a ObjectId,
    force: bool,
}

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GitSyncerError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn git_url(&self, coords: &RepositoryCoordinates, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/{}",
            self.base_url, coords.owner, coords.repo, suffix
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn send(&self, op: Operation, builder: RequestBuilder) -> Result<Response> {
        log::debug!("GitHub request: {}", op.name());
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GitSyncerError::timeout(op.name())
            } else {
                GitSyncerError::transport(format!("{}: {e}", op.name()))
            }
        })
    }

    /// Decode a success body, or classify the failure
    async fn decode<T: DeserializeOwned>(
        op: Operation,
        response: Response,
        coords: &RepositoryCoordinates,
        subject: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            log::debug!("{} returned {status}: {message}", op.name());
            return Err(api_error(op, status.as_u16(), &message, coords, subject));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GitSyncerError::timeout(op.name())
            } else {
                op.malformed(e)
            }
        })?;
        serde_json::from_str(&body).map_err(|e| op.malformed(e))
    }

    /// Whether `username` is a registered account
    pub async fn account_exists(&self, username: &str) -> Result<bool> {
        let url = format!("{}/users/{}", self.base_url, username);
        let response = self
            .send(Operation::GetUser, self.request(Method::GET, url))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                let message = response.text().await.unwrap_or_default();
                Err(GitSyncerError::unauthorized(status.as_u16(), message))
            }
            status => Err(GitSyncerError::transport(format!(
                "{} failed for '{username}' (HTTP {status})",
                Operation::GetUser.name()
            ))),
        }
    }
}

#[async_trait]
impl RemoteObjectStore for GitHubClient {
    async fn get_branch_head(&self, coords: &RepositoryCoordinates) -> Result<BranchRef> {
        let op = Operation::GetBranchHead;
        let url = self.git_url(coords, &format!("ref/heads/{}", coords.branch));
        let response = self.send(op, self.request(Method::GET, url)).await?;
        let reference: ApiRef = Self::decode(op, response, coords, &coords.branch).await?;

        Ok(BranchRef {
            branch: coords.branch.clone(),
            commit: reference.object.sha,
        })
    }

    async fn get_commit(
        &self,
        coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<CommitHandle> {
        let op = Operation::GetCommit;
        let url = self.git_url(coords, &format!("commits/{commit}"));
        let response = self.send(op, self.request(Method::GET, url)).await?;
        let commit: ApiCommit =
            Self::decode(op, response, coords, &format!("commit {commit}")).await?;
        Ok(commit.into())
    }

    async fn get_tree(
        &self,
        coords: &RepositoryCoordinates,
        tree: &ObjectId,
    ) -> Result<Vec<RemoteTreeEntry>> {
        let op = Operation::GetTree;
        let url = self.git_url(coords, &format!("trees/{tree}?recursive=1"));
        let response = self.send(op, self.request(Method::GET, url)).await?;
        let listing: ApiTree = Self::decode(op, response, coords, &format!("tree {tree}")).await?;

        if listing.truncated {
            // Entries past the cut stay in place through base_tree
            log::warn!(
                "Tree {} listing was truncated at {} entries",
                tree.short(),
                listing.tree.len()
            );
        }
        Ok(listing.tree)
    }

    async fn create_blob(
        &self,
        coords: &RepositoryCoordinates,
        content: &[u8],
        encoding: BlobEncoding,
    ) -> Result<ObjectId> {
        let op = Operation::CreateBlob;
        let (content, encoding) = encode_blob(content, encoding)?;
        let body = CreateBlobRequest { content, encoding };
        let url = self.git_url(coords, "blobs");
        let response = self
            .send(op, self.request(Method::POST, url).json(&body))
            .await?;
        let blob: ApiShaRef = Self::decode(op, response, coords, "blob").await?;
        Ok(blob.sha)
    }

    async fn create_tree(
        &self,
        coords: &RepositoryCoordinates,
        tree: &OverlayedTree,
    ) -> Result<ObjectId> {
        let op = Operation::CreateTree;
        let body = CreateTreeRequest::from_overlay(tree);
        let url = self.git_url(coords, "trees");
        let response = self
            .send(op, self.request(Method::POST, url).json(&body))
            .await?;
        let created: ApiShaRef =
            Self::decode(op, response, coords, tree.base_tree.as_str()).await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        coords: &RepositoryCoordinates,
        commit: &NewCommit,
    ) -> Result<CommitHandle> {
        let op = Operation::CreateCommit;
        let body = CreateCommitRequest {
            message: &commit.message,
            tree: &commit.tree,
            parents: [&commit.parent],
            author: commit.author.as_ref(),
        };
        let url = self.git_url(coords, "commits");
        let response = self
            .send(op, self.request(Method::POST, url).json(&body))
            .await?;
        let created: ApiCommit =
            Self::decode(op, response, coords, &format!("tree {}", commit.tree)).await?;
        Ok(created.into())
    }

    async fn update_branch_ref(
        &self,
        coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<BranchRef> {
        let op = Operation::UpdateBranchRef;
        let body = UpdateRefRequest {
            sha: commit,
            force: false,
        };
        let url = self.git_url(coords, &format!("refs/heads/{}", coords.branch));
        let response = self
            .send(op, self.request(Method::PATCH, url).json(&body))
            .await?;
        let reference: ApiRef = Self::decode(op, response, coords, &coords.branch).await?;

        Ok(BranchRef {
            branch: coords.branch.clone(),
            commit: reference.object.sha,
        })
    }
}
