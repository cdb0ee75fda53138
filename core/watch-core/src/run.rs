//! One availability check, start to finish.
//!
//! ## State Machine
//!
//! ```text
//! START       parse --target-date          → bad input: ERROR, exit 2 (lock untouched)
//! LOCKING     flock watch.lock (no wait)   → held elsewhere: SKIP, exit 0
//! FETCHING    fetch_with_retry             → failure or panic: ERROR, exit 1
//! CLASSIFYING verdict from the day cell
//! DIFFING     previous status for this exact (date, location), else unknown
//! NOTIFYING   only when available and previous != available
//! PERSISTING  overwrite state.json         → failure: ERROR, exit 1
//! DONE        RESULT, exit 0
//! ```
//!
//! Every path writes exactly one line to the run log, and every path after
//! LOCKING releases the lock before returning.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{info, warn};

use crate::config::WatchConfig;
use crate::fetch::{fetch_with_retry, CalendarFetcher, Fetcher, RunOutcome, Sleeper, ThreadSleeper};
use crate::lock::RunLock;
use crate::notify::{DesktopNotifier, Notifier};
use crate::run_log::{now_timestamp, LogLevel, RunLog};
use crate::snapshot::save_snapshot;
use crate::state::{PersistedState, RunStatus};
use crate::storage::StorageConfig;
use crate::target::{format_run_params, parse_target_date, Location, TargetQuery};
use crate::webdriver::WebDriverAutomation;

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Check completed, or skipped because another run holds the lock.
    Success,
    /// Fetch failed or something unexpected went wrong.
    Failed,
    /// The target date could not be parsed.
    InvalidInput,
}

impl RunExit {
    pub fn code(&self) -> i32 {
        match self {
            RunExit::Success => 0,
            RunExit::Failed => 1,
            RunExit::InvalidInput => 2,
        }
    }
}

/// What a run did, for the CLI's console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exit: RunExit,
    pub level: LogLevel,
    pub message: String,
    pub notified: bool,
}

impl RunReport {
    fn new(exit: RunExit, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            exit,
            level,
            message: message.into(),
            notified: false,
        }
    }
}

pub struct Orchestrator<F, N, S> {
    storage: StorageConfig,
    fetcher: F,
    notifier: N,
    sleeper: S,
    notification_title: String,
}

impl Orchestrator<CalendarFetcher<WebDriverAutomation>, DesktopNotifier, ThreadSleeper> {
    /// Real browser, real notifications, real sleeps.
    pub fn production(storage: StorageConfig, config: &WatchConfig) -> Self {
        let automation = WebDriverAutomation::new(config, Some(storage.browser_profile_dir()));
        let fetcher = CalendarFetcher::new(automation, config.page_url.clone());
        Orchestrator::new(storage, fetcher, DesktopNotifier, ThreadSleeper)
            .with_notification_title(config.notification_title.clone())
    }
}

impl<F: Fetcher, N: Notifier, S: Sleeper> Orchestrator<F, N, S> {
    pub fn new(storage: StorageConfig, fetcher: F, notifier: N, sleeper: S) -> Self {
        Self {
            storage,
            fetcher,
            notifier,
            sleeper,
            notification_title: crate::config::DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }

    pub fn with_notification_title(mut self, title: String) -> Self {
        self.notification_title = title;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn run(&mut self, target_date: &str, location: Location) -> RunReport {
        let log = RunLog::new(self.storage.run_log_file());

        let query = match parse_target_date(target_date) {
            Ok(date) => TargetQuery::new(date, location),
            Err(err) => {
                let report = RunReport::new(RunExit::InvalidInput, LogLevel::Error, err.to_string());
                return record(&log, &now_timestamp(), &format_run_params(target_date, location), report);
            }
        };
        let params = query.run_params();

        let mut lock = match RunLock::acquire(&self.storage.lock_file()) {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                let report = RunReport::new(RunExit::Success, LogLevel::Skip, "overlapping run");
                return record(&log, &now_timestamp(), &params, report);
            }
            Err(err) => {
                let report = RunReport::new(RunExit::Failed, LogLevel::Error, format!("unexpected: {}", err));
                return record(&log, &now_timestamp(), &params, report);
            }
        };

        let timestamp = now_timestamp();
        let report = self.check(&query, &timestamp);
        let report = record(&log, &timestamp, &params, report);
        lock.release();
        report
    }

    /// FETCHING through PERSISTING. Caller holds the lock.
    fn check(&mut self, query: &TargetQuery, timestamp: &str) -> RunReport {
        let fetcher = &mut self.fetcher;
        let sleeper = &self.sleeper;
        let fetched = panic::catch_unwind(AssertUnwindSafe(|| fetch_with_retry(fetcher, sleeper, query)));

        let outcome: RunOutcome = match fetched {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                if let Some(page_text) = err.snapshot() {
                    self.write_snapshot(timestamp, page_text);
                }
                return RunReport::new(RunExit::Failed, LogLevel::Error, format!("detection: {}", err));
            }
            Err(payload) => {
                return RunReport::new(
                    RunExit::Failed,
                    LogLevel::Error,
                    format!("unexpected: {}", panic_message(payload.as_ref())),
                );
            }
        };

        if !outcome.available {
            self.write_snapshot(timestamp, &outcome.page_snapshot);
        }

        let state_path = self.storage.state_file();
        let previous = PersistedState::load(&state_path).previous_status(query);
        let should_notify = outcome.available && previous != RunStatus::Available;

        if should_notify {
            let message = format!(
                "Possible {}, {} availability found. Check now.",
                query.location,
                query.label()
            );
            self.notifier.notify(&self.notification_title, &message);
        }

        let state = PersistedState::new(
            query,
            RunStatus::from_available(outcome.available),
            timestamp.to_string(),
            outcome.reason.clone(),
        );
        if let Err(err) = state.save(&state_path) {
            return RunReport::new(RunExit::Failed, LogLevel::Error, format!("unexpected: {}", err));
        }

        info!(
            available = outcome.available,
            previous = ?previous,
            notified = should_notify,
            reason = %outcome.reason,
            "Check complete"
        );

        let message = if outcome.available {
            "Available!"
        } else {
            "Not Available!"
        };
        RunReport {
            notified: should_notify,
            ..RunReport::new(RunExit::Success, LogLevel::Result, message)
        }
    }

    fn write_snapshot(&self, timestamp: &str, page_text: &str) {
        if let Err(err) = save_snapshot(&self.storage.snapshot_file(), timestamp, page_text) {
            warn!(error = %err, "Failed to write diagnostic snapshot");
        }
    }
}

/// Writes the run's single log line. A log write failure is reported but
/// does not change the run's outcome.
fn record(log: &RunLog, timestamp: &str, params: &str, report: RunReport) -> RunReport {
    if let Err(err) = log.append(timestamp, report.level, &report.message, params) {
        warn!(error = %err, path = %log.path().display(), "Failed to append run log");
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during fetch".to_string()
    }
}
