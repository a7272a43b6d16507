use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Free-text place name passed to the weather provider as `q`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DashboardError::Configuration("location must not be empty".into()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive calendar-date range used to filter visualization series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(DashboardError::InvalidDateRange(format!("{from} is after {to}")));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Whole days between `from` and `to`.
    pub fn span_days(&self) -> u64 {
        (self.to - self.from).num_days().unsigned_abs()
    }

    /// Shrinks or grows the range by two days around its midpoint.
    ///
    /// Zooming in never goes below a two-day span. The result is clamped
    /// to `window`.
    pub fn zoom(&self, zoom_in: bool, window: &HistoryWindow) -> Self {
        let span = self.span_days();
        let new_span = if zoom_in { span.saturating_sub(2).max(2) } else { span + 2 };
        let mid = self.from + Days::new(span / 2);
        let half = Days::new(new_span / 2);
        let from = mid.checked_sub_days(half).unwrap_or(NaiveDate::MIN);
        let to = mid.checked_add_days(half).unwrap_or(NaiveDate::MAX);
        window.clamp(Self { from, to })
    }

    pub fn start_param(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from.format("%b %d, %Y"), self.to.format("%b %d, %Y"))
    }
}

/// Dates for which the backend has historical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryWindow {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            min_date: NaiveDate::from_ymd_opt(2008, 7, 1).unwrap_or(NaiveDate::MIN),
            max_date: NaiveDate::from_ymd_opt(2017, 6, 25).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl HistoryWindow {
    /// Reject ranges that leave the window.
    pub fn check(&self, range: DateRange) -> Result<DateRange> {
        if range.from < self.min_date || range.to > self.max_date {
            return Err(DashboardError::InvalidDateRange(format!(
                "{range} is outside the available data window {} - {}",
                self.min_date, self.max_date
            )));
        }
        Ok(range)
    }

    /// Pull `range` inside the window. An inverted window pins both ends to
    /// `max_date`.
    pub fn clamp(&self, range: DateRange) -> DateRange {
        let from = range.from.max(self.min_date).min(self.max_date);
        let to = range.to.min(self.max_date).max(from);
        DateRange { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_location_is_rejected() {
        assert!(Location::new("   ").is_err());
        assert_eq!(Location::new("Melbourne").unwrap().as_str(), "Melbourne");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(date("2017-06-25"), date("2017-06-17")).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDateRange(_)));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::new(date("2017-06-17"), date("2017-06-25")).unwrap();
        assert!(range.contains(date("2017-06-17")));
        assert!(range.contains(date("2017-06-25")));
        assert!(!range.contains(date("2017-06-26")));
    }

    #[test]
    fn window_rejects_ranges_past_the_data() {
        let window = HistoryWindow::default();
        let range = DateRange::new(date("2017-06-20"), date("2017-07-01")).unwrap();
        assert!(window.check(range).is_err());

        let inside = DateRange::new(date("2008-07-01"), date("2017-06-25")).unwrap();
        assert_eq!(window.check(inside).unwrap(), inside);
    }

    #[test]
    fn zoom_in_shrinks_around_midpoint() {
        let window = HistoryWindow::default();
        let range = DateRange::new(date("2017-06-01"), date("2017-06-11")).unwrap();

        let zoomed = range.zoom(true, &window);
        assert_eq!(zoomed.from, date("2017-06-02"));
        assert_eq!(zoomed.to, date("2017-06-10"));
    }

    #[test]
    fn zoom_in_stops_at_two_days() {
        let window = HistoryWindow::default();
        let range = DateRange::new(date("2017-06-10"), date("2017-06-12")).unwrap();

        let zoomed = range.zoom(true, &window);
        assert_eq!(zoomed.span_days(), 2);
    }

    #[test]
    fn zoom_with_inverted_window_does_not_panic() {
        let window = HistoryWindow { min_date: date("2017-06-25"), max_date: date("2008-07-01") };
        let range = DateRange::new(date("2017-06-17"), date("2017-06-25")).unwrap();

        let zoomed = range.zoom(true, &window);
        assert!(zoomed.from <= zoomed.to);
    }

    #[test]
    fn zoom_out_is_clamped_to_window() {
        let window = HistoryWindow::default();
        let range = DateRange::new(date("2017-06-17"), date("2017-06-25")).unwrap();

        let zoomed = range.zoom(false, &window);
        assert_eq!(zoomed.from, date("2017-06-16"));
        assert_eq!(zoomed.to, date("2017-06-25"));
    }
}
