use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::classifier::ClassifierOptions;
use crate::core::dirs::get_config_directory;
use crate::core::error::GitSyncerError;
use crate::core::github::GITHUB_API_BASE;
use crate::core::model::{BlobEncoding, RenameMode};
use crate::core::overlay::OverlayOptions;
use crate::core::sync::{AuthorIdentity, SyncOptions, DEFAULT_COMMIT_MESSAGE};

const CONFIG_FILE: &str = "config.json";
const TOKEN_VARS: [&str; 2] = ["GIT_SYNCER_TOKEN", "GITHUB_TOKEN"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub default_owner: Option<String>,
    pub commit_message: String,
    pub update_ref: bool,
    pub include_added: bool,
    pub staged_only: bool,
    pub rename_mode: RenameMode,
    pub blob_encoding: BlobEncoding,
    pub request_timeout_secs: u64,
    pub upload_concurrency: usize,
    pub author: Option<AuthorIdentity>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: GITHUB_API_BASE.to_string(),
            default_owner: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            update_ref: true,
            include_added: true,
            staged_only: false,
            rename_mode: RenameMode::default(),
            blob_encoding: BlobEncoding::default(),
            request_timeout_secs: 30,
            upload_concurrency: 4,
            author: None,
            last_sync: None,
        }
    }
}

impl SyncConfig {
    pub fn config_path() -> Result<PathBuf, GitSyncerError> {
        Ok(get_config_directory()?.join(CONFIG_FILE))
    }

    /// Load from the config directory; a missing file means defaults
    pub fn load() -> Result<Self, GitSyncerError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, GitSyncerError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), GitSyncerError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), GitSyncerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn record_sync(&mut self) -> Result<(), GitSyncerError> {
        self.last_sync = Some(Utc::now());
        self.save()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Options for a run before any command-line overrides
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            classifier: ClassifierOptions {
                include_added: self.include_added,
                staged_only: self.staged_only,
                collect_diffs: false,
                encoding: self.blob_encoding,
            },
            overlay: OverlayOptions {
                rename_mode: self.rename_mode,
                encoding: self.blob_encoding,
                upload_concurrency: self.upload_concurrency.max(1),
            },
            commit_message: self.commit_message.clone(),
            update_ref: self.update_ref,
            author: self.author.clone(),
        }
    }
}

/// Bearer token from the environment; never read from or written to the config file
pub fn resolve_token() -> Result<String, GitSyncerError> {
    TOKEN_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            GitSyncerError::configuration(format!(
                "No access token found; set {} or {}",
                TOKEN_VARS[0], TOKEN_VARS[1]
            ))
        })
}
