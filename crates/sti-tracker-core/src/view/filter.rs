//! History filters.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::DisplayRecord;

/// Inclusive calendar range. The end bound covers the whole end day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// No bound on either side.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Check a point in time against the range.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if ts < start.and_time(chrono::NaiveTime::MIN) {
                return false;
            }
        }
        if let Some(end) = self.end {
            // Anything before the next midnight is still on the end day.
            if let Some(next_day) = end.succ_opt() {
                if ts >= next_day.and_time(chrono::NaiveTime::MIN) {
                    return false;
                }
            }
        }
        true
    }

    /// Check an optional calendar date. Undated rows only pass an unbounded range.
    pub fn contains_date(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(d) => self.contains(d.and_time(chrono::NaiveTime::MIN)),
            None => self.is_unbounded(),
        }
    }
}

/// Conjunction of optional predicates over the history.
///
/// An empty STI or result set, or an absent date bound, places no
/// constraint on that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryFilter {
    pub stis: Vec<String>,
    pub results: Vec<String>,
    pub dates: DateRange,
}

impl HistoryFilter {
    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.stis.is_empty() && self.results.is_empty() && self.dates.is_unbounded()
    }

    pub fn matches(&self, row: &DisplayRecord) -> bool {
        if !self.stis.is_empty() && !self.stis.iter().any(|s| *s == row.sti) {
            return false;
        }
        if !self.results.is_empty() {
            match row.result.as_deref() {
                Some(result) if self.results.iter().any(|r| r == result) => {}
                _ => return false,
            }
        }
        self.dates.contains_date(row.test_date)
    }

    /// Matching rows, most recent test first.
    pub fn apply(&self, rows: &[DisplayRecord]) -> Vec<DisplayRecord> {
        let mut filtered: Vec<DisplayRecord> =
            rows.iter().filter(|row| self.matches(row)).cloned().collect();
        sort_by_test_date_desc(&mut filtered);
        filtered
    }
}

/// Stable sort, most recent first, undated rows last.
pub fn sort_by_test_date_desc(rows: &mut [DisplayRecord]) {
    rows.sort_by(|a, b| b.test_date.cmp(&a.test_date));
}

/// Choices offered by the filter form, derived from the full history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Distinct STIs, sorted
    pub stis: Vec<String>,
    /// Distinct results, sorted
    pub results: Vec<String>,
    /// Earliest and latest test date, used as the default range
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl FilterOptions {
    pub fn from_rows(rows: &[DisplayRecord]) -> Self {
        let stis: BTreeSet<&str> = rows
            .iter()
            .map(|r| r.sti.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        let results: BTreeSet<&str> = rows.iter().filter_map(|r| r.result.as_deref()).collect();

        let dates = rows.iter().filter_map(|r| r.test_date);
        let date_bounds = dates
            .clone()
            .min()
            .zip(dates.max());

        Self {
            stis: stis.into_iter().map(str::to_string).collect(),
            results: results.into_iter().map(str::to_string).collect(),
            date_bounds,
        }
    }
}

/// What the history page shows for one filter pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Rows in the unfiltered history
    pub total: usize,
    /// Filtered and sorted rows
    pub rows: Vec<DisplayRecord>,
    pub options: FilterOptions,
}

impl HistoryPage {
    /// Filter a full snapshot.
    pub fn build(snapshot: &[DisplayRecord], filter: &HistoryFilter) -> Self {
        Self {
            total: snapshot.len(),
            rows: filter.apply(snapshot),
            options: FilterOptions::from_rows(snapshot),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn caption(&self) -> String {
        format!("Showing {} out of {} records", self.rows.len(), self.total)
    }
}
