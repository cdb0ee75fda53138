//! # watch-core
//!
//! Availability-polling engine for the parking watcher. One invocation of the
//! CLI runs exactly one check through [`run::Orchestrator`].
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every renderer call blocks with its own timeout.
//! - **Single run per process**: Cross-process exclusion is the advisory [`lock::RunLock`].
//! - **Graceful degradation**: Missing or corrupt state reads as empty, never as an error.
//! - **Injected collaborators**: Renderer, notifier and sleeper are traits so the
//!   engine runs against fakes in tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use watch_core::{Location, Orchestrator, StorageConfig, WatchConfig};
//!
//! let storage = StorageConfig::from_env()?;
//! let config = WatchConfig::load(&storage);
//! let report = Orchestrator::production(storage, &config).run("2026-02-28", Location::Alpine);
//! std::process::exit(report.exit.code());
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod lock;
pub mod notify;
pub mod renderer;
pub mod run;
pub mod run_log;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod target;
pub mod webdriver;

pub use classify::{classify_day_style, ClassificationResult};
pub use config::WatchConfig;
pub use error::{FetchError, ParseError, RenderError, Result, WatchError};
pub use fetch::{
    fetch_with_retry, CalendarFetcher, Fetcher, RunOutcome, Sleeper, ThreadSleeper,
    BACKOFF_BASE_SECS, MAX_FETCH_ATTEMPTS,
};
pub use locator::{locate, CalendarProbe, MAX_PAGE_TURNS};
pub use lock::RunLock;
pub use notify::{DesktopNotifier, Notifier};
pub use renderer::{Automation, ElementHandle, Renderer};
pub use run::{Orchestrator, RunExit, RunReport};
pub use run_log::{LogLevel, RunLog};
pub use state::{PersistedState, RunStatus};
pub use storage::StorageConfig;
pub use target::{month_name_to_number, parse_target_date, DayLabel, Location, TargetQuery};
pub use webdriver::WebDriverAutomation;
