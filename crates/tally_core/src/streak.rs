//! Weekly streak computation.
//!
//! A streak is a consecutive run of weeks in which a habit's weekly target
//! was met, or excused by the partial-week grace rule. The walk is a pure
//! function over the habit's completion days; calling it twice with the same
//! inputs yields the same result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{
    available_days_remaining_in_week, days_remaining_in_week, today_local, weeks_between,
    WeekStartDay,
};
use crate::completion::completion_days_for_habit;
use crate::habit::{CompletionRecord, Habit};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakResult {
    /// Completions counted toward the active streak.
    pub current_streak: u32,
    /// Day the most recent streak ended, when broken.
    pub last_streak_broken_at: Option<NaiveDate>,
    /// First completion counted in the active streak.
    pub streak_start_date: Option<NaiveDate>,
}

impl StreakResult {
    fn empty() -> Self {
        Self {
            current_streak: 0,
            last_streak_broken_at: None,
            streak_start_date: None,
        }
    }

    fn broken(on: NaiveDate) -> Self {
        Self {
            current_streak: 0,
            last_streak_broken_at: Some(on),
            streak_start_date: None,
        }
    }
}

/// Walks every week from the habit's effective start through today and
/// classifies each one.
///
/// `completion_days` is the normalized output of the completion set model;
/// it is re-sorted and deduplicated defensively. `today_override` pins
/// "today" for deterministic tests and defaults to the local calendar day.
///
/// Never panics for well-formed input. Malformed habit dates have already
/// been reduced to `Option` at the parsing boundary.
pub fn recompute_streak(
    habit: &Habit,
    completion_days: &[NaiveDate],
    week_start_day: WeekStartDay,
    today_override: Option<NaiveDate>,
) -> StreakResult {
    let mut days = completion_days.to_vec();
    days.sort_unstable();
    days.dedup();

    if days.is_empty() {
        return StreakResult::empty();
    }

    let today = today_override.unwrap_or_else(today_local);
    let target = habit.weekly_target();

    // Week 0 is anchored by the earlier of creation day and first completion.
    let first_completion = days[0];
    let start = habit
        .created_day()
        .map_or(first_completion, |created| created.min(first_completion));

    let mut streak_active = true;
    let mut last_broken: Option<NaiveDate> = None;
    let mut streak_start: Option<NaiveDate> = None;

    for (index, week) in weeks_between(start, today, week_start_day).iter().enumerate() {
        let in_week: Vec<NaiveDate> = days.iter().copied().filter(|d| week.contains(*d)).collect();
        let hits = in_week.len() as u32;
        let first_in_week = in_week.first().copied();

        // Partial-week grace: the first active week since the start (or since
        // a break) is excused entirely when its first completion lands too
        // late to reach the target in the days left.
        let mut required = target;
        let first_active_week =
            index == 0 || last_broken.map_or(false, |broken| week.start > broken);
        if first_active_week {
            if let Some(first_hit) = first_in_week {
                if days_remaining_in_week(first_hit, week_start_day) < required {
                    required = 0;
                }
            }
        }

        let successful = required == 0 || hits >= required;

        if !successful {
            if week.contains(today) {
                let available =
                    available_days_remaining_in_week(today, week_start_day, &in_week);
                if hits + available < required {
                    // The current week can no longer reach its target; the
                    // streak breaks as of today and no later week exists.
                    return StreakResult::broken(today);
                }
                // Still achievable, so the shortfall is provisional. A broken
                // streak restarts here only once the week holds a completion
                // to anchor the new start date.
                if !streak_active {
                    if let Some(first_hit) = first_in_week {
                        streak_active = true;
                        last_broken = None;
                        streak_start = Some(first_hit);
                    }
                }
            } else {
                streak_active = false;
                last_broken = Some(week.end());
                streak_start = None;
                continue;
            }
        }

        if successful {
            if !streak_active {
                streak_active = true;
                last_broken = None;
                streak_start = first_in_week;
            } else if streak_start.is_none() {
                // First success was a grace week; anchor the streak there.
                streak_start = first_in_week;
            }
        }
    }

    let current_streak = match (streak_active, streak_start) {
        (true, Some(anchor)) => days.iter().filter(|d| **d >= anchor).count() as u32,
        // Active, never broken, no explicit anchor: the genesis grace week.
        (true, None) if last_broken.is_none() => days.len() as u32,
        _ => 0,
    };

    tracing::debug!(
        habit = %habit.id,
        current_streak,
        streak_start = ?streak_start,
        last_broken = ?last_broken,
        "streak recomputed"
    );

    StreakResult {
        current_streak,
        last_streak_broken_at: last_broken,
        streak_start_date: streak_start,
    }
}

/// Record-level wrapper: reduces raw completion records to the habit's day
/// set and returns the current streak count.
pub fn calculate_habit_streak(
    habit: &Habit,
    records: &[CompletionRecord],
    week_start_setting: &str,
    today_override: Option<NaiveDate>,
) -> u32 {
    let days = completion_days_for_habit(&habit.id, records);
    recompute_streak(
        habit,
        &days,
        WeekStartDay::from_setting(week_start_setting),
        today_override,
    )
    .current_streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_day;
    use chrono::Duration;

    fn day(value: &str) -> NaiveDate {
        parse_day(value).expect("valid date literal")
    }

    fn habit(frequency: u32, created: &str) -> Habit {
        Habit {
            id: "h1".into(),
            name: "Test habit".into(),
            emoji: None,
            frequency,
            created_date: Some(created.into()),
            personal_best_streak: None,
        }
    }

    fn days(values: &[&str]) -> Vec<NaiveDate> {
        values.iter().map(|v| day(v)).collect()
    }

    #[test]
    fn no_completions_is_a_zero_result() {
        let result = recompute_streak(
            &habit(3, "2024-01-01"),
            &[],
            WeekStartDay::Monday,
            Some(day("2024-01-10")),
        );
        assert_eq!(result, StreakResult::empty());
    }

    #[test]
    fn is_a_pure_function() {
        let h = habit(3, "2024-01-01");
        let completions = days(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        let first = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-08")));
        let second = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-08")));
        assert_eq!(first, second);
    }

    #[test]
    fn daily_completions_count_in_full() {
        // A completion every single day from creation to today: every week
        // trivially succeeds and the streak equals the completion count.
        let h = habit(4, "2024-01-01");
        let mut completions = Vec::new();
        let mut d = day("2024-01-01");
        while d <= day("2024-01-24") {
            completions.push(d);
            d += Duration::days(1);
        }
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-24")));
        assert_eq!(result.current_streak, completions.len() as u32);
        assert_eq!(result.last_streak_broken_at, None);
        assert_eq!(result.streak_start_date, Some(day("2024-01-01")));
    }

    #[test]
    fn grace_excuses_a_late_first_week() {
        // Created on a Friday with the first completion that Friday and a
        // target of 5: only 3 days remain, so the first week is excused and
        // the streak counts from the first completion.
        let h = habit(5, "2024-01-05");
        let completions = days(&["2024-01-05", "2024-01-06"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-07")));
        assert_eq!(result.current_streak, 2);
        assert_eq!(result.streak_start_date, Some(day("2024-01-05")));
        assert_eq!(result.last_streak_broken_at, None);
    }

    #[test]
    fn grace_applies_to_the_first_week_only() {
        // Week 1 excused by grace, week 2 empty and fully past: the streak
        // breaks at week 2's end.
        let h = habit(5, "2024-01-05");
        let completions = days(&["2024-01-05"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-15")));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.last_streak_broken_at, Some(day("2024-01-14")));
        assert_eq!(result.streak_start_date, None);
    }

    #[test]
    fn achievable_current_week_keeps_the_streak_alive() {
        // Spec scenario: target 3, week 1 fully met, one hit in the current
        // week with five days still open.
        let h = habit(3, "2024-01-01");
        let completions = days(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-08"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-08")));
        assert_eq!(result.current_streak, 4);
        assert_eq!(result.streak_start_date, Some(day("2024-01-01")));
        assert_eq!(result.last_streak_broken_at, None);
    }

    #[test]
    fn empty_past_week_breaks_the_streak() {
        // Same habit, but week 2 passed with no completions at all.
        let h = habit(3, "2024-01-01");
        let completions = days(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-15")));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.last_streak_broken_at, Some(day("2024-01-14")));
        assert_eq!(result.streak_start_date, None);
    }

    #[test]
    fn unachievable_current_week_breaks_immediately() {
        // Target 5, no completions yet this week, checked on Friday: only
        // 3 days remain, so the target is out of reach today.
        let h = habit(5, "2024-01-01");
        let completions = days(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-04",
            "2024-01-05",
        ]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-12")));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.last_streak_broken_at, Some(day("2024-01-12")));
        assert_eq!(result.streak_start_date, None);
    }

    #[test]
    fn daily_habit_break_is_detected_the_following_week() {
        // Target 7: one hit on day 1 of week 2 and nothing else. Checked in
        // week 3, week 2 is a failed past week.
        let h = habit(7, "2024-01-01");
        let mut completions = days(&["2024-01-08"]);
        let mut d = day("2024-01-01");
        while d <= day("2024-01-07") {
            completions.push(d);
            d += Duration::days(1);
        }
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-15")));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.last_streak_broken_at, Some(day("2024-01-14")));
    }

    #[test]
    fn streak_restarts_after_a_break() {
        // Week 1 met, week 2 empty (break), week 3 met again: the streak
        // restarts from week 3's first completion.
        let h = habit(2, "2024-01-01");
        let completions = days(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-16",
            "2024-01-17",
        ]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-21")));
        assert_eq!(result.current_streak, 2);
        assert_eq!(result.streak_start_date, Some(day("2024-01-16")));
        assert_eq!(result.last_streak_broken_at, None);
    }

    #[test]
    fn broken_streak_restarts_mid_current_week_once_anchored() {
        // Break in week 2, then a single completion in the still-achievable
        // current week: the streak provisionally restarts there.
        let h = habit(3, "2024-01-01");
        let completions = days(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-16",
        ]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-16")));
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.streak_start_date, Some(day("2024-01-16")));
        assert_eq!(result.last_streak_broken_at, None);
    }

    #[test]
    fn empty_current_week_does_not_clear_an_earlier_break() {
        // Without a completion in the current week there is nothing to
        // anchor a restart on, so the earlier break stands.
        let h = habit(3, "2024-01-01");
        let completions = days(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-16")));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.last_streak_broken_at, Some(day("2024-01-14")));
        assert_eq!(result.streak_start_date, None);
    }

    #[test]
    fn frequency_one_is_satisfied_by_any_weekly_hit() {
        let h = habit(1, "2024-01-01");
        let completions = days(&["2024-01-03", "2024-01-10", "2024-01-17"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-18")));
        assert_eq!(result.current_streak, 3);
        assert_eq!(result.streak_start_date, Some(day("2024-01-03")));
    }

    #[test]
    fn monotone_additions_never_shrink_the_streak() {
        let h = habit(2, "2024-01-01");
        let today = day("2024-01-18");
        let additions = days(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-08",
            "2024-01-09",
            "2024-01-15",
            "2024-01-16",
        ]);
        let mut previous = 0;
        for cut in 1..=additions.len() {
            let streak =
                recompute_streak(&h, &additions[..cut], WeekStartDay::Monday, Some(today))
                    .current_streak;
            assert!(streak >= previous, "streak shrank after adding a completion");
            previous = streak;
        }
    }

    #[test]
    fn earliest_of_creation_and_first_completion_anchors_week_zero() {
        // A completion logged before the recorded creation day still opens
        // the walk at its own week.
        let h = habit(1, "2024-01-10");
        let completions = days(&["2024-01-02", "2024-01-10"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-10")));
        assert_eq!(result.current_streak, 2);
        assert_eq!(result.streak_start_date, Some(day("2024-01-02")));
    }

    #[test]
    fn sunday_start_weeks_shift_the_boundaries() {
        // 2024-01-07 is a Sunday. With Sunday-start weeks it opens a new
        // bucket; with Monday-start weeks it closes the previous one.
        let h = habit(2, "2024-01-01");
        let completions = days(&["2024-01-01", "2024-01-02", "2024-01-07", "2024-01-08"]);
        let monday = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-08")));
        let sunday = recompute_streak(&h, &completions, WeekStartDay::Sunday, Some(day("2024-01-08")));
        assert_eq!(monday.current_streak, 4);
        assert_eq!(sunday.current_streak, 4);
        assert_eq!(monday.streak_start_date, Some(day("2024-01-01")));
        assert_eq!(sunday.streak_start_date, Some(day("2024-01-01")));
    }

    #[test]
    fn duplicate_days_count_once() {
        let h = habit(1, "2024-01-01");
        let completions = days(&["2024-01-03", "2024-01-03", "2024-01-03"]);
        let result = recompute_streak(&h, &completions, WeekStartDay::Monday, Some(day("2024-01-04")));
        assert_eq!(result.current_streak, 1);
    }

    #[test]
    fn record_wrapper_filters_by_habit_and_completed_flag() {
        let h = habit(1, "2024-01-01");
        let records = vec![
            CompletionRecord {
                id: "c1".into(),
                user_habit_id: Some("h1".into()),
                completion_date: Some("2024-01-02".into()),
                completed: true,
                ..CompletionRecord::default()
            },
            CompletionRecord {
                id: "c2".into(),
                habit_id: Some("h1".into()),
                completion_date: Some("2024-01-09".into()),
                completed: false,
                ..CompletionRecord::default()
            },
            CompletionRecord {
                id: "c3".into(),
                habit_id: Some("other".into()),
                completion_date: Some("2024-01-09".into()),
                completed: true,
                ..CompletionRecord::default()
            },
        ];
        let streak = calculate_habit_streak(&h, &records, "monday", Some(day("2024-01-03")));
        assert_eq!(streak, 1);
    }
}
