//! Append-only run log: exactly one line per invocation.
//!
//! ```text
//! [2026-02-20 07:15:02] [RESULT] Not Available! (--target-date 2026-02-28 --location ALPINE)
//! [2026-02-20 07:20:01] [SKIP] overlapping run (--target-date 2026-02-28 --location ALPINE)
//! [2026-02-20 07:25:03] [ERROR] detection: renderer timeout: page load (after 3 attempts) (--target-date ...)
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use fs_err::{self as fs, OpenOptions};

use crate::error::{Result, WatchError};

/// Local wall-clock timestamp used in log lines, snapshots and state.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Result,
    Error,
    Skip,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Result => "RESULT",
            LogLevel::Error => "ERROR",
            LogLevel::Skip => "SKIP",
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(timestamp: &str, level: LogLevel, message: &str, params: &str) -> String {
        format!("[{}] [{}] {} ({})", timestamp, level, message, params)
    }

    /// Appends one line; creates the log directory on first use.
    pub fn append(&self, timestamp: &str, level: LogLevel, message: &str, params: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| WatchError::io("Failed to create log directory", e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| WatchError::io("Failed to open run log", e))?;

        writeln!(file, "{}", Self::format_line(timestamp, level, message, params))
            .map_err(|e| WatchError::io("Failed to append to run log", e))
    }
}
