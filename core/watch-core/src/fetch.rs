//! One availability verdict per run, with bounded retries.
//!
//! ## Retry policy
//!
//! - At most [`MAX_FETCH_ATTEMPTS`] attempts.
//! - Linear backoff between attempts: `BACKOFF_BASE_SECS * attempt` (2s, 4s).
//! - [`FetchError::AutomationUnavailable`] is returned at once: a missing
//!   automation client is a setup problem, not a flaky page.
//! - Exhaustion wraps the last failure in [`FetchError::FetchFailed`], whose
//!   message ends with `(after 3 attempts)`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::classify::classify_day_style;
use crate::error::FetchError;
use crate::locator::locate;
use crate::renderer::Automation;
use crate::target::TargetQuery;

pub const MAX_FETCH_ATTEMPTS: u32 = 3;
pub const BACKOFF_BASE_SECS: u64 = 2;

/// Result of one successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub available: bool,
    pub reason: String,
    pub page_snapshot: String,
}

/// A single fetch attempt.
pub trait Fetcher {
    fn fetch_once(&mut self, query: &TargetQuery) -> Result<RunOutcome, FetchError>;
}

/// Blocking delay between attempts; swapped for a recorder in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub fn fetch_with_retry<F, S>(
    fetcher: &mut F,
    sleeper: &S,
    query: &TargetQuery,
) -> Result<RunOutcome, FetchError>
where
    F: Fetcher + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut last_error = None;

    for attempt in 1..=MAX_FETCH_ATTEMPTS {
        match fetcher.fetch_once(query) {
            Ok(outcome) => {
                debug!(attempt, available = outcome.available, "Fetch succeeded");
                return Ok(outcome);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(attempt, error = %err, "Fetch attempt failed");
                last_error = Some(err);
                if attempt < MAX_FETCH_ATTEMPTS {
                    sleeper.sleep(Duration::from_secs(BACKOFF_BASE_SECS * u64::from(attempt)));
                }
            }
        }
    }

    let last = last_error
        .unwrap_or_else(|| FetchError::Renderer("calendar fetch failed for an unknown reason".to_string()));
    Err(FetchError::FetchFailed {
        last: Box::new(last),
        attempts: MAX_FETCH_ATTEMPTS,
    })
}

/// Production fetcher: opens a renderer session, locates the cell, classifies it.
pub struct CalendarFetcher<A: Automation> {
    automation: A,
    page_url: String,
}

impl<A: Automation> CalendarFetcher<A> {
    pub fn new(automation: A, page_url: impl Into<String>) -> Self {
        Self {
            automation,
            page_url: page_url.into(),
        }
    }
}

impl<A: Automation> Fetcher for CalendarFetcher<A> {
    fn fetch_once(&mut self, query: &TargetQuery) -> Result<RunOutcome, FetchError> {
        let label = query.label();
        let mut session = self.automation.open()?;
        let probe = locate(&mut session, &self.page_url, query, &label)?;
        let verdict = classify_day_style(probe.style.as_deref(), probe.disabled.as_deref());

        Ok(RunOutcome {
            available: verdict.available,
            reason: verdict.reason,
            page_snapshot: probe.body_snapshot,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::{RecordingSleeper, ScriptedFetcher};
    use super::*;
    use crate::error::RenderError;
    use crate::locator::test_utils::FakeCalendar;
    use crate::target::{parse_target_date, Location};
    use std::cell::Cell;

    fn query() -> TargetQuery {
        TargetQuery::new(parse_target_date("2026-02-28").unwrap(), Location::Alpine)
    }

    fn ok_outcome() -> RunOutcome {
        RunOutcome {
            available: true,
            reason: "ok".to_string(),
            page_snapshot: "snapshot".to_string(),
        }
    }

    #[test]
    fn test_retries_then_succeeds() {
        let mut fetcher = ScriptedFetcher::new(vec![
            Err(FetchError::Renderer("renderer timeout: slow page".to_string())),
            Ok(ok_outcome()),
        ]);
        let sleeper = RecordingSleeper::default();

        let result = fetch_with_retry(&mut fetcher, &sleeper, &query());

        assert_eq!(result, Ok(ok_outcome()));
        assert_eq!(fetcher.calls, 2);
        assert_eq!(
            *sleeper.sleeps.borrow(),
            vec![Duration::from_secs(BACKOFF_BASE_SECS)]
        );
    }

    #[test]
    fn test_raises_after_max_attempts() {
        let mut fetcher = ScriptedFetcher::new(vec![Err(FetchError::CellNotFound {
            label: "Saturday, February 28, 2026".to_string(),
            snapshot: String::new(),
        })]);
        let sleeper = RecordingSleeper::default();

        let err = fetch_with_retry(&mut fetcher, &sleeper, &query()).unwrap_err();

        assert!(err.to_string().contains("after 3 attempts"));
        assert!(err.to_string().contains("target day cell not found"));
        assert_eq!(fetcher.calls, MAX_FETCH_ATTEMPTS);
        assert_eq!(sleeper.sleeps.borrow().len() as u32, MAX_FETCH_ATTEMPTS - 1);
        assert_eq!(
            *sleeper.sleeps.borrow(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[test]
    fn test_does_not_retry_if_automation_missing() {
        let mut fetcher = ScriptedFetcher::new(vec![Err(FetchError::AutomationUnavailable(
            "webdriver not reachable".to_string(),
        ))]);
        let sleeper = RecordingSleeper::default();

        let err = fetch_with_retry(&mut fetcher, &sleeper, &query()).unwrap_err();

        assert!(err.to_string().contains("webdriver not reachable"));
        assert_eq!(fetcher.calls, 1);
        assert!(sleeper.sleeps.borrow().is_empty());
    }

    struct FakeAutomation {
        page: Cell<Option<FakeCalendar>>,
    }

    impl Automation for FakeAutomation {
        type Session = FakeCalendar;

        fn open(&self) -> Result<FakeCalendar, RenderError> {
            self.page
                .take()
                .ok_or_else(|| RenderError::Unavailable("no browser".to_string()))
        }
    }

    #[test]
    fn test_calendar_fetcher_classifies_located_cell() {
        let q = query();
        let page = FakeCalendar::showing(parse_target_date("2026-01-01").unwrap()).with_cell(
            q.date,
            Some("background-color: rgba(49, 200, 25, 0.2);"),
            Some("false"),
        );
        let mut fetcher = CalendarFetcher::new(
            FakeAutomation {
                page: Cell::new(Some(page)),
            },
            "https://parking.example/select-parking",
        );

        let outcome = fetcher.fetch_once(&q).unwrap();
        assert!(outcome.available);
        assert!(outcome.page_snapshot.contains("style=background-color: rgba(49, 200, 25, 0.2);"));

        // Session factory is now empty; that reads as a missing automation client.
        let err = fetcher.fetch_once(&q).unwrap_err();
        assert!(matches!(err, FetchError::AutomationUnavailable(_)));
    }
}
