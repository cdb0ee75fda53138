//! Runtime configuration, loaded from `config.json` under the storage root.
//!
//! The file is optional. Missing fields take defaults, a malformed file is
//! logged and ignored, so a bad edit never stops the scheduled checks.

use std::env;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::StorageConfig;

/// Overrides [`WatchConfig::webdriver_url`].
pub const WEBDRIVER_URL_ENV: &str = "PARKING_WATCH_WEBDRIVER_URL";

pub const DEFAULT_PAGE_URL: &str = "https://reservenski.parkpalisadestahoe.com/select-parking";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Palisades Parking Watcher";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// WebDriver endpoint (chromedriver or compatible).
    pub webdriver_url: String,
    /// Reservation page holding the calendar.
    pub page_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
    pub notification_title: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            page_url: DEFAULT_PAGE_URL.to_string(),
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_width: 1428,
            window_height: 1008,
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

impl WatchConfig {
    /// Loads the config file (defaults when absent) and applies env overrides.
    pub fn load(storage: &StorageConfig) -> Self {
        let path = storage.config_file();
        let mut config = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Malformed config file; using defaults");
                WatchConfig::default()
            }),
            Err(_) => WatchConfig::default(),
        };

        if let Ok(url) = env::var(WEBDRIVER_URL_ENV) {
            if !url.trim().is_empty() {
                config.webdriver_url = url.trim().to_string();
            }
        }

        config
    }
}
