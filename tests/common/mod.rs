//! Shared test utilities for git-syncer integration tests
//!
//! Real throw-away git repositories on the local side, an in-memory object store
//! on the remote side.

pub mod assertions;
pub mod memory_remote;
pub mod repository;
