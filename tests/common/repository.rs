//! Git repository management and setup utilities
//!
//! Creates throw-away repositories through the git CLI so the local side of a sync
//! is exercised against real status output.

#![allow(dead_code)]

use git_syncer::core::error::{GitSyncerError, Result};
use git_syncer::core::git::GitRepo;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// The TempDir must outlive the test or the repository is removed under it.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<GitRepo> {
        GitRepo::open(&self.path)
    }
}

fn git(repo_path: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()?;
    if !output.status.success() {
        return Err(GitSyncerError::configuration(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

/// Fresh repository on branch `main` with a committer identity and an `origin` remote
pub fn setup_test_repo() -> Result<TestRepo> {
    let temp_dir = TempDir::new()?;
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "-b", "main"])?;
    git(&repo_path, &["config", "user.name", "Test User"])?;
    git(&repo_path, &["config", "user.email", "test@example.com"])?;
    git(
        &repo_path,
        &["remote", "add", "origin", "https://github.com/octo/site.git"],
    )?;

    Ok(TestRepo {
        temp_dir,
        path: repo_path,
    })
}

/// Repository whose single commit holds `files`
pub fn setup_committed_repo(files: &[(&str, &str)]) -> Result<TestRepo> {
    let repo = setup_test_repo()?;
    for (name, content) in files {
        create_file(&repo.path, name, content)?;
    }
    git_add(&repo.path, ".")?;
    git_commit(&repo.path, "Initial commit")?;
    Ok(repo)
}

/// Writes `filename`, creating parent directories as needed
pub fn create_file(repo_path: &Path, filename: &str, content: &str) -> Result<()> {
    write_bytes(repo_path, filename, content.as_bytes())
}

pub fn write_bytes(repo_path: &Path, filename: &str, content: &[u8]) -> Result<()> {
    let target = repo_path.join(filename);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, content)?;
    Ok(())
}

pub fn remove_file(repo_path: &Path, filename: &str) -> Result<()> {
    fs::remove_file(repo_path.join(filename))?;
    Ok(())
}

pub fn git_add(repo_path: &Path, filename: &str) -> Result<()> {
    git(repo_path, &["add", filename])
}

pub fn git_mv(repo_path: &Path, from: &str, to: &str) -> Result<()> {
    git(repo_path, &["mv", from, to])
}

pub fn git_commit(repo_path: &Path, message: &str) -> Result<()> {
    git(repo_path, &["commit", "-m", message])
}
