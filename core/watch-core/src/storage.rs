//! Storage configuration and path management for the watcher.
//!
//! Every file the watcher touches lives under one root directory:
//!
//! ```text
//! ~/.parking-watch/
//! ├── config.json      # optional WatchConfig overrides
//! ├── state.json       # last status for notification dedup
//! ├── watch.log        # append-only, one line per run
//! ├── watch.lock       # advisory lock, zero bytes
//! ├── last_page.txt    # diagnostic snapshot, overwritten
//! ├── browser-profile/ # WebDriver user-data dir
//! └── debug.log        # tracing output from the CLI
//! ```
//!
//! Production code uses [`StorageConfig::from_env`]; tests use
//! [`StorageConfig::with_root`] pointed at a temp directory.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchError};

/// Overrides the root directory (used by cron installs and tests).
pub const HOME_ENV: &str = "PARKING_WATCH_HOME";

const DEFAULT_DIR_NAME: &str = ".parking-watch";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// `$PARKING_WATCH_HOME` if set and non-empty, else `~/.parking-watch`.
    pub fn from_env() -> Result<Self> {
        if let Some(root) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(WatchError::HomeDirNotFound)?;
        Ok(Self::with_root(home.join(DEFAULT_DIR_NAME)))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn run_log_file(&self) -> PathBuf {
        self.root.join("watch.log")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join("watch.lock")
    }

    pub fn snapshot_file(&self) -> PathBuf {
        self.root.join("last_page.txt")
    }

    /// Persistent browser profile, so the site sees a returning visitor.
    pub fn browser_profile_dir(&self) -> PathBuf {
        self.root.join("browser-profile")
    }

    /// File name only; the tracing appender takes directory and name separately.
    pub fn debug_log_name(&self) -> &'static str {
        "debug.log"
    }
}
