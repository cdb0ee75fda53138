//! Persisted run state used to deduplicate availability notifications.
//!
//! # File Format
//!
//! ```json
//! {
//!   "status": "available",
//!   "last_run": "2026-02-20 07:15:02",
//!   "last_reason": "Calendar day color is green (available)",
//!   "target_date": "2026-02-28",
//!   "location": "ALPINE"
//! }
//! ```
//!
//! The dedup memory is scoped to one (target_date, location) pair. A stored
//! record for any other pair reads as [`RunStatus::Unknown`], so switching the
//! target always allows a fresh notification.
//!
//! # Defensive Design
//!
//! A missing, empty or corrupt file loads as the default state (logged, never
//! propagated). Writes replace the whole file via temp file + rename.

use std::io::Write;
use std::path::Path;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Result, WatchError};
use crate::target::{Location, TargetQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Unknown,
    Available,
    NotAvailable,
}

impl RunStatus {
    pub fn from_available(available: bool) -> Self {
        if available {
            RunStatus::Available
        } else {
            RunStatus::NotAvailable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub last_reason: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl PersistedState {
    pub fn new(query: &TargetQuery, status: RunStatus, last_run: String, last_reason: String) -> Self {
        Self {
            status,
            last_run: Some(last_run),
            last_reason: Some(last_reason),
            target_date: Some(query.date.format("%Y-%m-%d").to_string()),
            location: Some(query.location),
        }
    }

    /// Status of the previous run for this exact query, `Unknown` for any other.
    pub fn previous_status(&self, query: &TargetQuery) -> RunStatus {
        let same_date = self.target_date.as_deref() == Some(query.date.format("%Y-%m-%d").to_string().as_str());
        let same_location = self.location == Some(query.location);

        if same_date && same_location {
            self.status
        } else {
            RunStatus::Unknown
        }
    }

    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(error = %err, "Failed to read state file; starting fresh");
                return Self::default();
            }
        };

        if content.trim().is_empty() {
            return Self::default();
        }

        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "Corrupt state file; starting fresh");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| WatchError::NoParent(path.to_path_buf()))?;
        fs::create_dir_all(parent).map_err(|e| WatchError::io("Failed to create state directory", e))?;

        let content = serde_json::to_string_pretty(self).map_err(|source| WatchError::Json {
            context: "Failed to serialize state".to_string(),
            source,
        })?;

        let mut temp_file =
            NamedTempFile::new_in(parent).map_err(|e| WatchError::io("Temp file error", e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| WatchError::io("Failed to write temp state file", e))?;
        temp_file
            .flush()
            .map_err(|e| WatchError::io("Failed to flush temp state file", e))?;
        temp_file
            .persist(path)
            .map_err(|e| WatchError::io("Failed to write state file", e.error))?;

        Ok(())
    }
}
