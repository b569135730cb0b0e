//! Sync orchestration.
//!
//! A [`SyncRun`] is the context of one invocation: the remote store, the caller's
//! coordinate overrides and the options. It walks a linear state machine
//!
//! ```text
//! Idle → ClassifyingChanges → FetchingParent → OverlayingTree → CreatingCommit → [UpdatingRef] → Done
//! ```
//!
//! and any failure aborts the run where it happened. Blobs or trees created before an
//! abort are left behind; they are unreferenced and harmless.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{
    classifier::{classify, Classification, ClassifierOptions},
    coordinates::{resolve_coordinates, CoordinateOverrides},
    error::{GitSyncerError, Result},
    git::VcsOracle,
    model::{BranchRef, CommitHandle, LocalChangeSet, ObjectId, OverlayedTree, RepositoryCoordinates},
    overlay::{apply_overlay, OverlayOptions},
    remote::{CommitAuthor, NewCommit, RemoteObjectStore},
};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Sync changes from CLI tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    ClassifyingChanges,
    FetchingParent,
    OverlayingTree,
    CreatingCommit,
    UpdatingRef,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::ClassifyingChanges => "classifying changes",
            SyncPhase::FetchingParent => "fetching parent",
            SyncPhase::OverlayingTree => "overlaying tree",
            SyncPhase::CreatingCommit => "creating commit",
            SyncPhase::UpdatingRef => "updating ref",
            SyncPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub classifier: ClassifierOptions,
    pub overlay: OverlayOptions,
    pub commit_message: String,
    /// Move the branch to the new commit. When off the commit is left as a proposal.
    pub update_ref: bool,
    pub author: Option<AuthorIdentity>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            classifier: ClassifierOptions::default(),
            overlay: OverlayOptions::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            update_ref: true,
            author: None,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub coordinates: RepositoryCoordinates,
    /// Branch head observed at the start of the run.
    pub parent: ObjectId,
    pub commit: CommitHandle,
    pub tree: OverlayedTree,
    pub changes: LocalChangeSet,
    /// Branch position after the run; `None` when the ref was left alone.
    pub branch: Option<BranchRef>,
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Nothing to sync; the remote was not contacted.
    NoChanges,
    Committed(Box<SyncReport>),
}

impl SyncOutcome {
    pub fn commit_id(&self) -> Option<&ObjectId> {
        match self {
            SyncOutcome::NoChanges => None,
            SyncOutcome::Committed(report) => Some(&report.commit.sha),
        }
    }
}

pub struct SyncRun<'a> {
    store: &'a dyn RemoteObjectStore,
    overrides: CoordinateOverrides,
    options: SyncOptions,
    phase: SyncPhase,
}

impl<'a> SyncRun<'a> {
    pub fn new(
        store: &'a dyn RemoteObjectStore,
        overrides: CoordinateOverrides,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            overrides,
            options,
            phase: SyncPhase::Idle,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    fn enter(&mut self, phase: SyncPhase) {
        log::debug!("Sync phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Run to a terminal state, consuming the context
    pub async fn run(mut self, oracle: &dyn VcsOracle) -> Result<SyncOutcome> {
        self.enter(SyncPhase::ClassifyingChanges);
        let classification = match classify(oracle, &self.options.classifier) {
            Ok(classification) => classification,
            Err(e) => return Err(self.abort(e)),
        };
        self.run_classified(classification, oracle).await
    }

    /// Continue from an already computed classification
    pub async fn run_classified(
        mut self,
        classification: Classification,
        oracle: &dyn VcsOracle,
    ) -> Result<SyncOutcome> {
        let changes = match classification {
            Classification::NoChanges => {
                log::info!("No changes to sync");
                return Ok(SyncOutcome::NoChanges);
            }
            Classification::Changes(changes) => changes,
        };

        match self.execute(changes, oracle).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.abort(e)),
        }
    }

    fn abort(&self, error: GitSyncerError) -> GitSyncerError {
        log::warn!("Sync aborted while {}: {error}", self.phase);
        error
    }

    async fn execute(
        &mut self,
        changes: LocalChangeSet,
        oracle: &dyn VcsOracle,
    ) -> Result<SyncOutcome> {
        let coords = resolve_coordinates(&self.overrides, oracle)?;
        log::info!("Syncing {} change(s) to {coords}", changes.len());

        self.enter(SyncPhase::FetchingParent);
        let head = self.store.get_branch_head(&coords).await?;
        let parent = self.store.get_commit(&coords, &head.commit).await?;
        log::debug!(
            "Branch head {} has tree {}",
            head.commit.short(),
            parent.tree.short()
        );

        self.enter(SyncPhase::OverlayingTree);
        let (overlay, tree) = apply_overlay(
            self.store,
            &coords,
            &parent.tree,
            &changes,
            &self.options.overlay,
        )
        .await?;

        self.enter(SyncPhase::CreatingCommit);
        let request = NewCommit {
            message: self.options.commit_message.clone(),
            tree,
            parent: head.commit.clone(),
            author: self.options.author.as_ref().map(|a| CommitAuthor {
                name: a.name.clone(),
                email: a.email.clone(),
                date: Utc::now(),
            }),
        };
        let commit = self.store.create_commit(&coords, &request).await?;
        log::info!("Created commit {}", commit.sha.short());

        let branch = if self.options.update_ref {
            self.enter(SyncPhase::UpdatingRef);
            let branch = self.store.update_branch_ref(&coords, &commit.sha).await?;
            log::info!("Branch {} now at {}", branch.branch, branch.commit.short());
            Some(branch)
        } else {
            log::info!("Leaving branch {} untouched", coords.branch);
            None
        };

        self.enter(SyncPhase::Done);
        Ok(SyncOutcome::Committed(Box::new(SyncReport {
            coordinates: coords,
            parent: head.commit,
            commit,
            tree: overlay,
            changes,
            branch,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert!(options.update_ref);
        assert_eq!(options.commit_message, DEFAULT_COMMIT_MESSAGE);
        assert!(options.classifier.include_added);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SyncPhase::FetchingParent.to_string(), "fetching parent");
        assert_eq!(SyncPhase::UpdatingRef.to_string(), "updating ref");
    }

    #[test]
    fn test_no_changes_has_no_commit() {
        assert!(SyncOutcome::NoChanges.commit_id().is_none());
    }
}
