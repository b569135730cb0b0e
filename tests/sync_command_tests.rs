use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

mod common;
use common::{assertions, repository::*};

/// `git-syncer sync` for repository `site` on `main`, isolated from the user's config and token
fn sync_cmd(dir: &Path, config_dir: &Path) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("git-syncer")?;
    cmd.current_dir(dir)
        .env("GIT_SYNCER_CONFIG_DIR", config_dir)
        .env("NO_COLOR", "1")
        .env_remove("GIT_SYNCER_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .args(["sync", "--repo", "site", "--branch", "main", "--username", "octo"]);
    Ok(cmd)
}

#[cfg(test)]
mod sync_command_tests {
    use super::*;

    #[test]
    fn test_sync_outside_repository_fails() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = TempDir::new()?;

        sync_cmd(dir.path(), config.path())?
            .assert()
            .failure()
            .code(1)
            .stdout(assertions::not_in_git_repo());
        Ok(())
    }

    #[test]
    fn test_sync_requires_repo_branch_and_username() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;

        Command::cargo_bin("git-syncer")?
            .arg("sync")
            .current_dir(&repo.path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("--repo"))
            .stderr(predicate::str::contains("--branch"))
            .stderr(predicate::str::contains("--username"));
        Ok(())
    }

    #[test]
    fn test_clean_repository_reports_no_changes() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .assert()
            .success()
            .stdout(assertions::no_changes());

        // Nothing synced, so nothing recorded
        assert!(!config.path().join("config.json").exists());
        Ok(())
    }

    #[test]
    fn test_missing_token_fails_before_contacting_remote() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;
        create_file(&repo.path, "a.txt", "changed\n")?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .assert()
            .failure()
            .code(1)
            .stdout(assertions::has_change("modified", "a.txt"))
            .stdout(assertions::missing_token());
        Ok(())
    }

    #[test]
    fn test_dry_run_lists_changes() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n"), ("b.txt", "b\n")])?;
        create_file(&repo.path, "a.txt", "changed\n")?;
        create_file(&repo.path, "nested/c.txt", "c\n")?;
        remove_file(&repo.path, "b.txt")?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .arg("--dry-run")
            .assert()
            .success()
            .stdout(predicate::str::contains("Changes to sync (3)"))
            .stdout(assertions::has_change("modified", "a.txt"))
            .stdout(assertions::has_change("added", "nested/c.txt"))
            .stdout(assertions::has_change("deleted", "b.txt"))
            .stdout(predicate::str::contains("Dry run"));
        Ok(())
    }

    #[test]
    fn test_dry_run_skip_added() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;
        create_file(&repo.path, "a.txt", "changed\n")?;
        create_file(&repo.path, "scratch.txt", "tmp\n")?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .args(["--dry-run", "--skip-added"])
            .assert()
            .success()
            .stdout(assertions::has_change("modified", "a.txt"))
            .stdout(predicate::str::contains("scratch.txt").not());
        Ok(())
    }

    #[test]
    fn test_dry_run_shows_diff() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "old line\n")])?;
        create_file(&repo.path, "a.txt", "new line\n")?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .args(["--dry-run", "--show-diff"])
            .assert()
            .success()
            .stdout(predicate::str::contains("-old line"))
            .stdout(predicate::str::contains("+new line"));
        Ok(())
    }

    #[test]
    fn test_rename_is_listed_with_both_paths() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("old.txt", "content\n")])?;
        git_mv(&repo.path, "old.txt", "new.txt")?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .arg("--dry-run")
            .assert()
            .success()
            .stdout(assertions::has_change("renamed", "old.txt -> new.txt"));
        Ok(())
    }

    #[test]
    fn test_invalid_rename_mode_is_rejected() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .args(["--rename-mode", "copy"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("reuse-blob"));
        Ok(())
    }

    #[test]
    fn test_debug_flag_is_global() -> anyhow::Result<()> {
        let repo = setup_committed_repo(&[("a.txt", "a\n")])?;
        let config = TempDir::new()?;

        sync_cmd(&repo.path, config.path())?
            .arg("--debug")
            .assert()
            .success()
            .stdout(assertions::no_changes());
        Ok(())
    }
}
