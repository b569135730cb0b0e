use crate::core::error::GitSyncerError;
use std::path::PathBuf;

const APP_DIR: &str = "git-syncer";

pub fn get_config_directory() -> Result<PathBuf, GitSyncerError> {
    // Explicit override wins over the per-OS location
    if let Ok(dir) = std::env::var("GIT_SYNCER_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config"))),
        "macos" => dirs::home_dir().map(|home| home.join("Library/Application Support")),
        _ => dirs::config_dir(),
    };

    base.map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| GitSyncerError::configuration("Could not find a configuration directory"))
}
