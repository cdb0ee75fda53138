//! Target resolution: which day, which lot, and how the calendar names that day.
//!
//! [`DayLabel`] must match the `aria-label` the reservation calendar assigns to
//! its day cells byte for byte, e.g. `Saturday, February 28, 2026`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parking lot selectable on the reservation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    #[default]
    Alpine,
    Palisades,
}

impl Location {
    /// Visible text of the location choice on the page.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Alpine => "ALPINE",
            Location::Palisades => "PALISADES",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "ALPINE" => Ok(Location::Alpine),
            "PALISADES" => Ok(Location::Palisades),
            _ => Err(ParseError::Location(value.to_string())),
        }
    }
}

/// One monitoring intent: a date at a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetQuery {
    pub date: NaiveDate,
    pub location: Location,
}

impl TargetQuery {
    pub fn new(date: NaiveDate, location: Location) -> Self {
        Self { date, location }
    }

    pub fn label(&self) -> DayLabel {
        DayLabel::for_date(self.date)
    }

    /// First day of the target month, used when paging the calendar.
    pub fn target_month(&self) -> NaiveDate {
        first_of_month(self.date)
    }

    /// CLI-equivalent parameters, appended to every run log line.
    pub fn run_params(&self) -> String {
        format_run_params(&self.date.format("%Y-%m-%d").to_string(), self.location)
    }
}

pub(crate) fn format_run_params(target_date: &str, location: Location) -> String {
    format!("--target-date {} --location {}", target_date, location)
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Accessible label of a calendar day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLabel(String);

impl DayLabel {
    pub fn for_date(date: NaiveDate) -> Self {
        DayLabel(date.format("%A, %B %-d, %Y").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses a strict `YYYY-MM-DD` date.
///
/// chrono alone accepts single-digit months and days, so the shape is checked first.
pub fn parse_target_date(value: &str) -> Result<NaiveDate, ParseError> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_formed {
        return Err(ParseError::TargetDate(value.to_string()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ParseError::TargetDate(value.to_string()))
}

/// Maps `February`, `Feb`, `FEB` ... to 2. Only the first three characters count.
pub fn month_name_to_number(name: &str) -> Result<u32, ParseError> {
    let prefix: String = name.trim().chars().take(3).collect::<String>().to_lowercase();

    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbrev| *abbrev == prefix)
        .map(|index| index as u32 + 1)
        .ok_or_else(|| ParseError::MonthName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_label() {
        let date = parse_target_date("2026-02-28").unwrap();
        assert_eq!(DayLabel::for_date(date).as_str(), "Saturday, February 28, 2026");
    }

    #[test]
    fn test_target_label_unpadded_day() {
        let date = parse_target_date("2026-03-01").unwrap();
        assert_eq!(DayLabel::for_date(date).as_str(), "Sunday, March 1, 2026");
    }

    #[test]
    fn test_month_name_to_number() {
        assert_eq!(month_name_to_number("February"), Ok(2));
        assert_eq!(month_name_to_number("Mar"), Ok(3));
        assert_eq!(month_name_to_number("december"), Ok(12));
        assert_eq!(month_name_to_number(" JAN "), Ok(1));
    }

    #[test]
    fn test_month_name_rejects_garbage() {
        assert!(matches!(month_name_to_number("Fe"), Err(ParseError::MonthName(_))));
        assert!(matches!(month_name_to_number(""), Err(ParseError::MonthName(_))));
        assert!(matches!(month_name_to_number("Smarch"), Err(ParseError::MonthName(_))));
    }

    #[test]
    fn test_parse_target_date_rejects_other_shapes() {
        for bad in ["2026-2-28", "26-02-28", "2026/02/28", "2026-02-28T00", " 2026-02-28", "abcd-ef-gh"] {
            assert!(parse_target_date(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_target_date_rejects_impossible_dates() {
        assert!(parse_target_date("2026-02-30").is_err());
        assert!(parse_target_date("2026-13-01").is_err());
        assert!(parse_target_date("2028-02-29").is_ok());
    }

    #[test]
    fn test_location_parse_is_case_insensitive() {
        assert_eq!("alpine".parse::<Location>(), Ok(Location::Alpine));
        assert_eq!("Palisades".parse::<Location>(), Ok(Location::Palisades));
        assert!("squaw".parse::<Location>().is_err());
        assert_eq!(Location::Palisades.to_string(), "PALISADES");
    }

    #[test]
    fn test_run_params() {
        let query = TargetQuery::new(parse_target_date("2026-02-28").unwrap(), Location::Alpine);
        assert_eq!(query.run_params(), "--target-date 2026-02-28 --location ALPINE");
        assert_eq!(query.target_month(), parse_target_date("2026-02-01").unwrap());
    }
}
