//! Calendar navigation: find the target day cell and read its signals.
//!
//! ## Search
//!
//! ```text
//! navigate → settle → error banner? → pick location → settle
//!   loop (≤ MAX_PAGE_TURNS):
//!     cell present?            → done
//!     header month <  target   → Next page
//!     header month >  target   → Previous page
//!     header month == target   → done (cell genuinely missing)
//!     settle, re-probe
//! ```
//!
//! The page-turn cap keeps a broken navigation control from hanging the run.
//! Sixteen turns covers more than a year in either direction.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::FetchError;
use crate::renderer::{ElementHandle, Renderer};
use crate::target::{month_name_to_number, DayLabel, TargetQuery};

pub const MAX_PAGE_TURNS: usize = 16;

/// Page text kept in snapshots, in characters.
pub const SNAPSHOT_TEXT_LIMIT: usize = 50_000;

const ERROR_BANNER: &str = "Something went wrong";
const MONTH_SELECTOR: &str = r#".custom-nav button[data-index="0"] .mbsc-calendar-month"#;
const YEAR_SELECTOR: &str = r#".custom-nav button[data-index="0"] .mbsc-calendar-year"#;
const NEXT_PAGE_SELECTOR: &str = r#"button[aria-label="Next page"]"#;
const PREVIOUS_PAGE_SELECTOR: &str = r#"button[aria-label="Previous page"]"#;

const PAGE_LOAD_SETTLE: Duration = Duration::from_millis(5_000);
const LOCATION_SETTLE: Duration = Duration::from_millis(1_500);
const PAGE_TURN_SETTLE: Duration = Duration::from_millis(500);

/// Raw signals read off the target day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarProbe {
    pub style: Option<String>,
    pub disabled: Option<String>,
    /// Target label, raw attributes and bounded page text, for diagnostics.
    pub body_snapshot: String,
}

/// Loads `page_url`, selects the query's location and reads the day cell for `label`.
pub fn locate<R: Renderer>(
    renderer: &mut R,
    page_url: &str,
    query: &TargetQuery,
    label: &DayLabel,
) -> Result<CalendarProbe, FetchError> {
    renderer.navigate(page_url)?;
    renderer.wait(PAGE_LOAD_SETTLE);

    // Once the page is up, every failure leaves the page text behind for diagnosis.
    read_day_cell(renderer, query, label).map_err(|err| {
        let page_text = renderer.body_text().unwrap_or_default();
        err.with_snapshot(bounded(&page_text))
    })
}

fn read_day_cell<R: Renderer>(
    renderer: &mut R,
    query: &TargetQuery,
    label: &DayLabel,
) -> Result<CalendarProbe, FetchError> {
    let body = renderer.body_text()?;
    if body.contains(ERROR_BANNER) {
        return Err(FetchError::RenderedErrorState {
            snapshot: bounded(&body),
        });
    }

    let location_choice = renderer.find_by_text(query.location.as_str())?;
    let Some(choice) = location_choice.first() else {
        return Err(FetchError::LocationNotFound {
            location: query.location,
            snapshot: bounded(&body),
        });
    };
    renderer.click(choice)?;
    renderer.wait(LOCATION_SETTLE);

    let cell_selector = day_cell_selector(label);
    let mut cells = renderer.find_by_css(&cell_selector)?;
    let target_month = query.target_month();

    for turn in 0..MAX_PAGE_TURNS {
        if !cells.is_empty() {
            break;
        }

        let displayed = displayed_month(renderer)?;
        let direction = match displayed.cmp(&target_month) {
            Ordering::Less => NEXT_PAGE_SELECTOR,
            Ordering::Greater => PREVIOUS_PAGE_SELECTOR,
            Ordering::Equal => break,
        };
        debug!(turn, displayed = %displayed, target = %target_month, direction, "Paging calendar");

        let control = first_match(renderer, direction)?;
        renderer.click(&control)?;
        renderer.wait(PAGE_TURN_SETTLE);
        cells = renderer.find_by_css(&cell_selector)?;
    }

    let Some(cell) = cells.first() else {
        let body = renderer.body_text().unwrap_or_default();
        return Err(FetchError::CellNotFound {
            label: label.to_string(),
            snapshot: bounded(&body),
        });
    };

    let style = renderer.attribute(cell, "style")?;
    let disabled = renderer.attribute(cell, "aria-disabled")?;
    let body = renderer.body_text()?;

    let body_snapshot = format!(
        "target={}\nstyle={}\naria_disabled={}\n-----\n{}\n",
        label,
        style.as_deref().unwrap_or("None"),
        disabled.as_deref().unwrap_or("None"),
        bounded(&body)
    );

    Ok(CalendarProbe {
        style,
        disabled,
        body_snapshot,
    })
}

fn day_cell_selector(label: &DayLabel) -> String {
    format!(r#"[aria-label="{}"]"#, label.as_str().replace('"', r#"\""#))
}

/// First-of-month date currently shown in the calendar header.
fn displayed_month<R: Renderer>(renderer: &mut R) -> Result<NaiveDate, FetchError> {
    let month_el = first_match(renderer, MONTH_SELECTOR)?;
    let year_el = first_match(renderer, YEAR_SELECTOR)?;

    let month_text = renderer.text(&month_el)?;
    let year_text = renderer.text(&year_el)?;

    let month = month_name_to_number(month_text.trim())?;
    let year: i32 = year_text.trim().parse().map_err(|_| {
        FetchError::UnexpectedPage(format!("calendar year is not a number: {:?}", year_text))
    })?;

    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        FetchError::UnexpectedPage(format!("calendar header out of range: {} {}", month_text, year))
    })
}

fn first_match<R: Renderer>(renderer: &mut R, selector: &str) -> Result<ElementHandle, FetchError> {
    renderer
        .find_by_css(selector)?
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::UnexpectedPage(format!("element not found: {}", selector)))
}

pub(crate) fn bounded(text: &str) -> String {
    text.chars().take(SNAPSHOT_TEXT_LIMIT).collect()
}
