//! Normalization of raw completion records into sorted sets of calendar days.

use chrono::NaiveDate;

use crate::calendar::parse_day;
use crate::habit::CompletionRecord;

/// The logical day a record belongs to: `completion_date` when present, else
/// the date portion of the record's creation timestamp.
pub fn completion_day(record: &CompletionRecord) -> Option<NaiveDate> {
    record
        .completion_date
        .as_deref()
        .or(record.created_date.as_deref())
        .and_then(parse_day)
}

/// Completed days for one habit: filtered by [`CompletionRecord::habit_ref`]
/// and the `completed` flag, ascending, deduplicated. Empty input yields an
/// empty set.
pub fn completion_days_for_habit(habit_id: &str, records: &[CompletionRecord]) -> Vec<NaiveDate> {
    let days = records
        .iter()
        .filter(|record| record.completed && record.habit_ref() == Some(habit_id))
        .filter_map(completion_day)
        .collect();
    sorted_unique(days)
}

/// Same normalization for raw `YYYY-MM-DD` / ISO-8601 strings. Unparseable
/// entries are dropped.
pub fn normalize_days(values: &[String]) -> Vec<NaiveDate> {
    let days = values.iter().filter_map(|value| parse_day(value)).collect();
    sorted_unique(days)
}

fn sorted_unique(mut days: Vec<NaiveDate>) -> Vec<NaiveDate> {
    days.sort_unstable();
    days.dedup();
    days
}
