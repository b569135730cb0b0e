//! In-memory remote object store
//!
//! Behaves like the hosting service for the parts a sync run touches: content
//! addressed blobs, trees created on top of a base tree, commits and one branch ref
//! per name. Every call is counted and any operation can be made to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use git_syncer::core::{
    error::{GitSyncerError, Result},
    model::{
        BlobEncoding, BranchRef, CommitHandle, EntryType, FileMode, ObjectId, OverlayedTree,
        RemoteTreeEntry, RepositoryCoordinates,
    },
    remote::{blob_hash, NewCommit, RemoteObjectStore},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

pub const GET_BRANCH_HEAD: &str = "get_branch_head";
pub const GET_COMMIT: &str = "get_commit";
pub const GET_TREE: &str = "get_tree";
pub const CREATE_BLOB: &str = "create_blob";
pub const CREATE_TREE: &str = "create_tree";
pub const CREATE_COMMIT: &str = "create_commit";
pub const UPDATE_BRANCH_REF: &str = "update_branch_ref";

#[derive(Debug, Clone)]
pub struct StoredCommit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
}

#[derive(Default)]
struct State {
    blobs: HashMap<ObjectId, Vec<u8>>,
    /// Blob entries only, keyed by full path
    trees: HashMap<ObjectId, BTreeMap<String, RemoteTreeEntry>>,
    commits: HashMap<ObjectId, StoredCommit>,
    branches: HashMap<String, ObjectId>,
    calls: HashMap<&'static str, usize>,
    faults: HashMap<&'static str, fn() -> GitSyncerError>,
    /// Branch moved by a concurrent writer right before our ref update
    race: Option<(String, ObjectId)>,
    last_tree_request: Option<OverlayedTree>,
    commit_counter: usize,
}

#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

fn tree_id(entries: &BTreeMap<String, RemoteTreeEntry>) -> Result<ObjectId> {
    let listing: String = entries
        .values()
        .map(|e| format!("{} {} {}\n", e.mode.as_str(), e.sha, e.path))
        .collect();
    blob_hash(format!("tree\n{listing}").as_bytes())
}

impl MemoryRemote {
    /// Remote whose `branch` has one root commit holding `files`
    pub fn with_files(branch: &str, files: &[(&str, &str)]) -> Self {
        let remote = MemoryRemote::default();
        remote.seed(branch, files, "Initial commit");
        remote
    }

    /// Commit `files` as the full tree on top of `branch`, returning the commit id
    pub fn seed(&self, branch: &str, files: &[(&str, &str)], message: &str) -> ObjectId {
        let mut state = self.state.lock().unwrap();
        let mut entries = BTreeMap::new();
        for (path, content) in files {
            let sha = blob_hash(content.as_bytes()).unwrap();
            state.blobs.insert(sha.clone(), content.as_bytes().to_vec());
            entries.insert(path.to_string(), RemoteTreeEntry::blob(*path, sha));
        }
        let tree = tree_id(&entries).unwrap();
        state.trees.insert(tree.clone(), entries);

        let parents = state.branches.get(branch).cloned().into_iter().collect();
        let commit = Self::store_commit(&mut state, tree, parents, message);
        state.branches.insert(branch.to_string(), commit.clone());
        commit
    }

    fn store_commit(
        state: &mut State,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
    ) -> ObjectId {
        state.commit_counter += 1;
        let sha = blob_hash(format!("commit {} {}", state.commit_counter, tree).as_bytes()).unwrap();
        state.commits.insert(
            sha.clone(),
            StoredCommit {
                tree,
                parents,
                message: message.to_string(),
            },
        );
        sha
    }

    /// Make every call to `operation` fail with `error()`
    pub fn fail_on(&self, operation: &'static str, error: fn() -> GitSyncerError) {
        self.state.lock().unwrap().faults.insert(operation, error);
    }

    /// Another writer commits `files` onto `branch` just before our ref update lands
    pub fn race_branch_update(&self, branch: &str, files: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        let head = state.branches.get(branch).cloned().unwrap();
        let mut entries = BTreeMap::new();
        for (path, content) in files {
            let sha = blob_hash(content.as_bytes()).unwrap();
            state.blobs.insert(sha.clone(), content.as_bytes().to_vec());
            entries.insert(path.to_string(), RemoteTreeEntry::blob(*path, sha));
        }
        let tree = tree_id(&entries).unwrap();
        state.trees.insert(tree.clone(), entries);
        let commit = Self::store_commit(&mut state, tree, vec![head], "Concurrent commit");
        state.race = Some((branch.to_string(), commit));
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    pub fn branch_head(&self, branch: &str) -> Option<ObjectId> {
        self.state.lock().unwrap().branches.get(branch).cloned()
    }

    pub fn commit(&self, sha: &ObjectId) -> Option<StoredCommit> {
        self.state.lock().unwrap().commits.get(sha).cloned()
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits.len()
    }

    /// `path -> content` of the tree a commit points at
    pub fn files_at(&self, commit: &ObjectId) -> BTreeMap<String, Vec<u8>> {
        let state = self.state.lock().unwrap();
        let tree = &state.commits[commit].tree;
        state.trees[tree]
            .values()
            .map(|e| (e.path.clone(), state.blobs[&e.sha].clone()))
            .collect()
    }

    pub fn entry_at(&self, commit: &ObjectId, path: &str) -> Option<RemoteTreeEntry> {
        let state = self.state.lock().unwrap();
        let tree = &state.commits[commit].tree;
        state.trees[tree].get(path).cloned()
    }

    pub fn last_tree_request(&self) -> Option<OverlayedTree> {
        self.state.lock().unwrap().last_tree_request.clone()
    }

    fn enter(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        if let Some(fault) = state.faults.get(operation).copied() {
            return Err(fault());
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteObjectStore for MemoryRemote {
    async fn get_branch_head(&self, coords: &RepositoryCoordinates) -> Result<BranchRef> {
        let state = self.enter(GET_BRANCH_HEAD)?;
        let commit = state
            .branches
            .get(&coords.branch)
            .cloned()
            .ok_or_else(|| GitSyncerError::ref_not_found(&coords.branch))?;
        Ok(BranchRef {
            branch: coords.branch.clone(),
            commit,
        })
    }

    async fn get_commit(
        &self,
        _coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<CommitHandle> {
        let state = self.enter(GET_COMMIT)?;
        let stored = state
            .commits
            .get(commit)
            .ok_or_else(|| GitSyncerError::object_not_found(format!("commit {commit}")))?;
        Ok(CommitHandle {
            sha: commit.clone(),
            tree: stored.tree.clone(),
            parents: stored.parents.clone(),
        })
    }

    /// Recursive listing, directory entries included
    async fn get_tree(
        &self,
        _coords: &RepositoryCoordinates,
        tree: &ObjectId,
    ) -> Result<Vec<RemoteTreeEntry>> {
        let state = self.enter(GET_TREE)?;
        let entries = state
            .trees
            .get(tree)
            .ok_or_else(|| GitSyncerError::object_not_found(format!("tree {tree}")))?;

        let directories: BTreeSet<String> = entries
            .keys()
            .flat_map(|path| {
                path.match_indices('/')
                    .map(|(i, _)| path[..i].to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        let mut listing: Vec<RemoteTreeEntry> = directories
            .into_iter()
            .map(|dir| RemoteTreeEntry {
                sha: blob_hash(format!("dir {dir}").as_bytes()).unwrap(),
                path: dir,
                mode: FileMode::Tree,
                entry_type: EntryType::Tree,
            })
            .collect();
        listing.extend(entries.values().cloned());
        Ok(listing)
    }

    async fn create_blob(
        &self,
        _coords: &RepositoryCoordinates,
        content: &[u8],
        _encoding: BlobEncoding,
    ) -> Result<ObjectId> {
        let mut state = self.enter(CREATE_BLOB)?;
        let sha = blob_hash(content)?;
        state.blobs.insert(sha.clone(), content.to_vec());
        Ok(sha)
    }

    async fn create_tree(
        &self,
        _coords: &RepositoryCoordinates,
        tree: &OverlayedTree,
    ) -> Result<ObjectId> {
        let mut state = self.enter(CREATE_TREE)?;
        let mut entries = state.trees.get(&tree.base_tree).cloned().ok_or_else(|| {
            GitSyncerError::tree_conflict(tree.base_tree.as_str(), "base tree is unknown")
        })?;

        for entry in tree.entries.iter().filter(|e| e.entry_type != EntryType::Tree) {
            if !state.blobs.contains_key(&entry.sha) {
                return Err(GitSyncerError::object_not_found(format!("blob {}", entry.sha)));
            }
            entries.insert(entry.path.clone(), entry.clone());
        }
        for entry in &tree.removed {
            entries.remove(&entry.path);
        }

        let sha = tree_id(&entries)?;
        state.trees.insert(sha.clone(), entries);
        state.last_tree_request = Some(tree.clone());
        Ok(sha)
    }

    async fn create_commit(
        &self,
        _coords: &RepositoryCoordinates,
        commit: &NewCommit,
    ) -> Result<CommitHandle> {
        let mut state = self.enter(CREATE_COMMIT)?;
        if !state.trees.contains_key(&commit.tree) {
            return Err(GitSyncerError::object_not_found(format!("tree {}", commit.tree)));
        }
        if !state.commits.contains_key(&commit.parent) {
            return Err(GitSyncerError::object_not_found(format!(
                "commit {}",
                commit.parent
            )));
        }
        let parents = vec![commit.parent.clone()];
        let sha = Self::store_commit(&mut state, commit.tree.clone(), parents.clone(), &commit.message);
        Ok(CommitHandle {
            sha,
            tree: commit.tree.clone(),
            parents,
        })
    }

    async fn update_branch_ref(
        &self,
        coords: &RepositoryCoordinates,
        commit: &ObjectId,
    ) -> Result<BranchRef> {
        let mut state = self.enter(UPDATE_BRANCH_REF)?;
        if let Some((branch, moved_to)) = state.race.take() {
            state.branches.insert(branch, moved_to);
        }

        let current = state
            .branches
            .get(&coords.branch)
            .cloned()
            .ok_or_else(|| GitSyncerError::ref_not_found(&coords.branch))?;
        let fast_forward = state
            .commits
            .get(commit)
            .is_some_and(|c| c.parents.contains(&current));
        if !fast_forward {
            return Err(GitSyncerError::non_fast_forward(&coords.branch));
        }

        state.branches.insert(coords.branch.clone(), commit.clone());
        Ok(BranchRef {
            branch: coords.branch.clone(),
            commit: commit.clone(),
        })
    }
}
