//! Week-partitioning date arithmetic.
//!
//! A "day" is always a discrete calendar unit: timestamps are truncated to
//! their local calendar date at the boundary and become [`NaiveDate`]s, so no
//! sub-day precision or timezone offset ever reaches the streak logic.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which day anchors the 7-day week. A per-user setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    Sunday,
    Monday,
}

impl WeekStartDay {
    /// Maps the stored `"sunday"`/`"monday"` setting. Anything else falls back
    /// to Monday.
    pub fn from_setting(value: &str) -> Self {
        if value.eq_ignore_ascii_case("sunday") {
            Self::Sunday
        } else {
            Self::Monday
        }
    }

    fn days_into_week(self, date: NaiveDate) -> i64 {
        match self {
            Self::Sunday => i64::from(date.weekday().num_days_from_sunday()),
            Self::Monday => i64::from(date.weekday().num_days_from_monday()),
        }
    }
}

/// Canonical start of the week containing `date`. Idempotent, and every date
/// in the same 7-day bucket maps to the same result.
pub fn week_start(date: NaiveDate, week_start_day: WeekStartDay) -> NaiveDate {
    date - Duration::days(week_start_day.days_into_week(date))
}

/// Days from `date` through the end of its week, inclusive of `date`.
/// Always in `1..=7`.
pub fn days_remaining_in_week(date: NaiveDate, week_start_day: WeekStartDay) -> u32 {
    (7 - week_start_day.days_into_week(date)) as u32
}

/// Like [`days_remaining_in_week`], but excluding days that already hold a
/// completion. Used to decide whether a partially-completed current week can
/// still reach its target before it ends.
pub fn available_days_remaining_in_week(
    date: NaiveDate,
    week_start_day: WeekStartDay,
    completed_days: &[NaiveDate],
) -> u32 {
    let week = Week::containing(date, week_start_day);
    let mut available = 0;
    let mut day = date;
    while day <= week.end() {
        if !completed_days.contains(&day) {
            available += 1;
        }
        day += Duration::days(1);
    }
    available
}

/// A 7-day interval `[start, start + 6]` anchored to the week-start
/// convention. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    pub start: NaiveDate,
}

impl Week {
    pub fn containing(date: NaiveDate, week_start_day: WeekStartDay) -> Self {
        Self {
            start: week_start(date, week_start_day),
        }
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// The seven calendar days of this week in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        (0..7).map(|offset| self.start + Duration::days(offset)).collect()
    }

    pub fn next(&self) -> Week {
        Week {
            start: self.start + Duration::days(7),
        }
    }
}

/// Every week from `start`'s week through `end`'s week, inclusive, in
/// chronological order. Empty when `start`'s week begins after `end`.
pub fn weeks_between(start: NaiveDate, end: NaiveDate, week_start_day: WeekStartDay) -> Vec<Week> {
    let mut weeks = Vec::new();
    let mut current = Week::containing(start, week_start_day);
    while current.start <= end {
        weeks.push(current);
        current = current.next();
    }
    weeks
}

/// Date portion of a `YYYY-MM-DD` string or a full ISO-8601 timestamp.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let day = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Today as the local calendar day. The only place wall-clock time enters the
/// engine; everything downstream works on plain dates.
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}
