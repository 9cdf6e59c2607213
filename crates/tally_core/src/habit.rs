use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::parse_day;

/// A recurring activity with a target number of completions per week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Target completions per week. The editing surface clamps this to 1..=7;
    /// the engine only relies on it being at least 1.
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    /// ISO-8601 creation timestamp. The earliest possible streak start.
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub personal_best_streak: Option<u32>,
}

fn default_frequency() -> u32 {
    1
}

impl Habit {
    /// The per-week requirement, never below 1.
    pub fn weekly_target(&self) -> u32 {
        self.frequency.max(1)
    }

    /// Creation timestamp truncated to its calendar day.
    pub fn created_day(&self) -> Option<NaiveDate> {
        self.created_date.as_deref().and_then(parse_day)
    }
}

/// One record that a habit was performed (or partially performed) on a
/// specific calendar day. Owned by its parent habit; cascade deletion is the
/// calling layer's job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    /// May be a temporary client-side value pending server confirmation.
    pub id: String,
    #[serde(default)]
    pub user_habit_id: Option<String>,
    #[serde(default)]
    pub habit_id: Option<String>,
    /// Logical calendar day the habit was performed, `YYYY-MM-DD`.
    #[serde(default)]
    pub completion_date: Option<String>,
    /// Record creation timestamp; only a fallback for `completion_date`.
    #[serde(default)]
    pub created_date: Option<String>,
    /// Records with `completed == false` carry partial progress and never
    /// count toward a streak.
    #[serde(default)]
    pub completed: bool,
    /// Daily-goal partial progress. Not consulted by the streak engine.
    #[serde(default)]
    pub progress_count: Option<i64>,
}

impl CompletionRecord {
    /// The owning habit id. Authenticated storage writes `user_habit_id`,
    /// local storage writes `habit_id`; everything downstream goes through
    /// this single accessor.
    pub fn habit_ref(&self) -> Option<&str> {
        self.user_habit_id.as_deref().or(self.habit_id.as_deref())
    }
}
