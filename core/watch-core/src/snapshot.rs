//! Diagnostic snapshot of the last page that did not show availability.
//!
//! Overwritten on every not-available result and every failed fetch that
//! captured page text, so it always describes the most recent miss.

use std::path::Path;

use fs_err as fs;

use crate::error::{Result, WatchError};
use crate::locator::bounded;

pub fn save_snapshot(path: &Path, timestamp: &str, page_text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WatchError::io("Failed to create snapshot directory", e))?;
    }

    let content = format!(
        "timestamp={}\ntext_length={}\n-----\n{}\n",
        timestamp,
        page_text.chars().count(),
        bounded(page_text)
    );
    fs::write(path, content).map_err(|e| WatchError::io("Failed to write snapshot", e))
}
