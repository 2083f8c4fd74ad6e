//! Test record models: persisted history rows and their display form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::draft::RegisterDraft;

/// Column set of the history file, in file order.
pub const HISTORY_COLUMNS: [&str; 7] = [
    "Test_date",
    "STI",
    "Test_type",
    "Result",
    "Location",
    "Notes",
    "Entry_ts",
];

/// One STI tested during one visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestRecord {
    #[serde(rename = "Test_date", default, deserialize_with = "lenient_date")]
    pub test_date: Option<NaiveDate>,
    #[serde(rename = "STI")]
    pub sti: String,
    #[serde(rename = "Test_type", default)]
    pub test_type: Option<String>,
    #[serde(rename = "Result", default)]
    pub result: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
    /// When the register was entered, truncated to midnight UTC
    #[serde(rename = "Entry_ts", default, deserialize_with = "lenient_timestamp")]
    pub entry_ts: Option<DateTime<Utc>>,
}

/// A history row as shown to the user.
///
/// `label` is the row's position in the full, unfiltered history at the
/// time the snapshot was taken. Deletions are resolved through it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisplayRecord {
    #[serde(skip)]
    pub label: usize,
    #[serde(rename = "Test_date")]
    pub test_date: Option<NaiveDate>,
    #[serde(rename = "STI")]
    pub sti: String,
    #[serde(rename = "Test_type")]
    pub test_type: Option<String>,
    #[serde(rename = "Result")]
    pub result: Option<String>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    #[serde(rename = "Register_date")]
    pub register_date: Option<DateTime<Utc>>,
}

impl DisplayRecord {
    pub fn from_record(label: usize, record: &TestRecord) -> Self {
        Self {
            label,
            test_date: record.test_date,
            sti: record.sti.clone(),
            test_type: record.test_type.clone(),
            result: record.result.clone(),
            location: record.location.clone(),
            notes: record.notes.clone(),
            register_date: record.entry_ts,
        }
    }
}

/// Truncate a timestamp to midnight UTC of the same day.
pub fn normalize_to_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&ts.date_naive().and_time(chrono::NaiveTime::MIN))
}

/// Build one record per tested STI from a finished draft.
///
/// Every row shares the draft's date, location, notes and `entry_ts`.
/// An STI without a recorded test type or result gets `None` there.
pub fn records_from_draft(draft: &RegisterDraft, entry_ts: DateTime<Utc>) -> Vec<TestRecord> {
    let entry_ts = normalize_to_day(entry_ts);
    draft
        .tested_stis
        .iter()
        .map(|sti| TestRecord {
            test_date: draft.date,
            sti: sti.clone(),
            test_type: draft.test_type_for(sti).map(str::to_string),
            result: draft.result_for(sti).map(str::to_string),
            location: draft.test_location.clone(),
            notes: draft.notes.clone(),
            entry_ts: Some(entry_ts),
        })
        .collect()
}

/// Parse a date cell: plain dates, date-times, or RFC 3339. Anything else is `None`.
pub fn parse_test_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// Parse an entry timestamp cell: RFC 3339, `YYYY-MM-DD HH:MM:SS+HH:MM`, or a plain date.
pub fn parse_entry_ts(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN)))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_test_date))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_entry_ts))
}
