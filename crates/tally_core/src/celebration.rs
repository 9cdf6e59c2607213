//! Milestone evaluation for completion toggles.
//!
//! The evaluator owns the set of already-seen milestone ids; the caller loads
//! it from and saves it back to the settings collaborator around each check.
//! One instance must not be checked concurrently, since the seen-set read and
//! the follow-up insert are separate steps.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{today_local, Week, WeekStartDay};
use crate::completion::completion_day;
use crate::habit::{CompletionRecord, Habit};
use crate::streak::calculate_habit_streak;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CelebrationIcon {
    PartyPopper,
    Rocket,
    Sparkles,
    Target,
    Flame,
    Trophy,
    Sun,
}

/// One celebratory card to show the user. `id` names the rule kind; the
/// durable dedup key is the milestone id held in the seen-set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CelebrationEvent {
    pub id: String,
    pub title: String,
    pub body: String,
    pub button_text: String,
    pub icon: CelebrationIcon,
}

/// Result of one [`CelebrationEvaluator::check`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Events to display, in evaluation order.
    pub events: Vec<CelebrationEvent>,
    /// New personal-best streak for the toggled habit, when this check set
    /// one. The caller persists it; the evaluator never mutates the habit.
    pub personal_best: Option<u32>,
}

#[derive(Debug, Default)]
pub struct CelebrationEvaluator {
    seen: HashSet<String>,
    queue: Vec<CelebrationEvent>,
}

impl CelebrationEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the seen-set, typically from persisted settings. A failed
    /// load upstream simply means an empty iterator here.
    pub fn load_state(&mut self, seen: impl IntoIterator<Item = String>) {
        self.seen = seen.into_iter().collect();
    }

    /// The seen-set in a stable order, for persistence.
    pub fn seen_milestones(&self) -> Vec<String> {
        let mut out: Vec<String> = self.seen.iter().cloned().collect();
        out.sort();
        out
    }

    /// Evaluates every rule for one completion toggle. Call exactly once per
    /// toggle, with the toggled habit's new record appended last in
    /// `all_completions`.
    pub fn check(
        &mut self,
        toggled: &Habit,
        all_habits: &[Habit],
        all_completions: &[CompletionRecord],
        week_start_setting: &str,
    ) -> CheckOutcome {
        self.check_at(
            toggled,
            all_habits,
            all_completions,
            week_start_setting,
            today_local(),
        )
    }

    /// [`check`](Self::check) with a pinned "today", for deterministic tests.
    pub fn check_at(
        &mut self,
        toggled: &Habit,
        all_habits: &[Habit],
        all_completions: &[CompletionRecord],
        week_start_setting: &str,
        today: NaiveDate,
    ) -> CheckOutcome {
        self.queue.clear();
        let week_start_day = WeekStartDay::from_setting(week_start_setting);
        let current_week = Week::containing(today, week_start_day);

        // Streak before and after this toggle: the freshly appended record is
        // the last one carrying the toggled habit's reference.
        let for_toggled: Vec<CompletionRecord> = all_completions
            .iter()
            .filter(|c| c.habit_ref() == Some(toggled.id.as_str()))
            .cloned()
            .collect();
        let old_streak = if for_toggled.is_empty() {
            0
        } else {
            calculate_habit_streak(
                toggled,
                &for_toggled[..for_toggled.len() - 1],
                week_start_setting,
                Some(today),
            )
        };
        let new_streak =
            calculate_habit_streak(toggled, &for_toggled, week_start_setting, Some(today));
        tracing::debug!(habit = %toggled.id, old_streak, new_streak, "evaluating celebrations");

        self.first_habit_check(all_completions);
        self.first_weekly_goal(toggled, all_completions, &current_week);
        let personal_best = self.new_personal_record(toggled, new_streak, all_habits);
        self.streak_milestone(toggled, new_streak, old_streak);
        self.weekly_single_habit(toggled, all_completions, &current_week);
        self.weekly_all_habits(all_habits, all_completions, &current_week);
        self.daily_goal_complete(all_habits, all_completions, today);

        CheckOutcome {
            events: std::mem::take(&mut self.queue),
            personal_best,
        }
    }

    fn enqueue(&mut self, event: CelebrationEvent) {
        if self.queue.iter().all(|queued| queued.id != event.id) {
            self.queue.push(event);
        }
    }

    fn week_hits(records: &[CompletionRecord], habit_id: &str, week: &Week) -> u32 {
        records
            .iter()
            .filter(|c| c.habit_ref() == Some(habit_id))
            .filter_map(completion_day)
            .filter(|day| week.contains(*day))
            .count() as u32
    }

    /// First-ever completion across all habits. Global, one-time.
    fn first_habit_check(&mut self, all_completions: &[CompletionRecord]) {
        let milestone = "global-first-habit-check";
        if all_completions.len() == 1 && !self.seen.contains(milestone) {
            self.enqueue(CelebrationEvent {
                id: "first-habit-check".into(),
                title: "You're On the Board!".into(),
                body: "Nice work, your first habit is checked. Keep that momentum going!".into(),
                button_text: "Let's Go".into(),
                icon: CelebrationIcon::PartyPopper,
            });
            self.seen.insert(milestone.into());
        }
    }

    /// First time any habit's weekly target is met. Global, one-time.
    fn first_weekly_goal(
        &mut self,
        habit: &Habit,
        all_completions: &[CompletionRecord],
        week: &Week,
    ) {
        let milestone = "global-first-weekly-goal";
        if self.seen.contains(milestone) {
            return;
        }
        let target = habit.weekly_target();
        if Self::week_hits(all_completions, &habit.id, week) >= target {
            self.enqueue(CelebrationEvent {
                id: "first-weekly-goal".into(),
                title: "First Weekly Win!".into(),
                body: format!(
                    "First time finishing {target}/{target} on {}. Way to start strong!",
                    habit.name
                ),
                button_text: "Let's Roll".into(),
                icon: CelebrationIcon::Rocket,
            });
            self.seen.insert(milestone.into());
        }
    }

    /// New personal-best streak. Recurring per habit; the event only fires
    /// once the new best exceeds 3, but the best itself always updates.
    fn new_personal_record(
        &mut self,
        habit: &Habit,
        new_streak: u32,
        all_habits: &[Habit],
    ) -> Option<u32> {
        let best = all_habits
            .iter()
            .find(|h| h.id == habit.id)
            .and_then(|h| h.personal_best_streak)
            .unwrap_or(0);
        if new_streak <= best {
            return None;
        }
        if new_streak > 3 {
            self.enqueue(CelebrationEvent {
                id: "new-personal-record".into(),
                title: "New Record!".into(),
                body: format!("Your longest ever for {}: {new_streak} days!", habit.name),
                button_text: "Woohoo!".into(),
                icon: CelebrationIcon::Sparkles,
            });
        }
        Some(new_streak)
    }

    /// Every 5th day of an active streak. Recurring per habit (10, 15, ...).
    fn streak_milestone(&mut self, habit: &Habit, new_streak: u32, old_streak: u32) {
        if new_streak > old_streak && new_streak > 0 && new_streak % 5 == 0 {
            let milestone = format!("habit-{}-streak-{new_streak}", habit.id);
            if !self.seen.contains(&milestone) {
                self.enqueue(CelebrationEvent {
                    id: "streak-milestone".into(),
                    title: format!("{new_streak}-Day Streak!"),
                    body: format!(
                        "You're crushing {} {new_streak} days straight! Onwards!",
                        habit.name
                    ),
                    button_text: "Keep It Up".into(),
                    icon: CelebrationIcon::Target,
                });
                self.seen.insert(milestone);
            }
        }
    }

    /// One habit's weekly target met. Recurring per habit, per week. Skipped
    /// for frequency-1 habits, where every hit would qualify.
    fn weekly_single_habit(
        &mut self,
        habit: &Habit,
        all_completions: &[CompletionRecord],
        week: &Week,
    ) {
        let target = habit.weekly_target();
        if target < 2 {
            return;
        }
        if Self::week_hits(all_completions, &habit.id, week) >= target {
            let milestone = format!("habit-{}-week-{}", habit.id, week.start);
            if !self.seen.contains(&milestone) {
                self.enqueue(CelebrationEvent {
                    id: "weekly-single-habit".into(),
                    title: "Weekly Win!".into(),
                    body: format!(
                        "You've completed {target}/{target} for {} this week. Well done!",
                        habit.name
                    ),
                    button_text: "Sweet!".into(),
                    icon: CelebrationIcon::Flame,
                });
                self.seen.insert(milestone);
            }
        }
    }

    /// Every habit's weekly target met at once. Global, per week.
    fn weekly_all_habits(
        &mut self,
        all_habits: &[Habit],
        all_completions: &[CompletionRecord],
        week: &Week,
    ) {
        if all_habits.is_empty() {
            return;
        }
        let all_met = all_habits
            .iter()
            .all(|h| Self::week_hits(all_completions, &h.id, week) >= h.weekly_target());
        if all_met {
            let milestone = format!("global-all-habits-week-{}", week.start);
            if !self.seen.contains(&milestone) {
                self.enqueue(CelebrationEvent {
                    id: "weekly-all-habits".into(),
                    title: "All-Around Champion!".into(),
                    body: "Every habit is in the green this week. Keep the streak alive!".into(),
                    button_text: "Awesome!".into(),
                    icon: CelebrationIcon::Trophy,
                });
                self.seen.insert(milestone);
            }
        }
    }

    /// Every habit completed today. Not recorded in the seen-set, so it
    /// re-fires on each check while the day stays fully complete; callers
    /// that want at-most-once-per-day must dedup themselves.
    fn daily_goal_complete(
        &mut self,
        all_habits: &[Habit],
        all_completions: &[CompletionRecord],
        today: NaiveDate,
    ) {
        if all_habits.len() < 2 {
            return;
        }
        let all_done = all_habits.iter().all(|h| {
            all_completions.iter().any(|c| {
                c.completed
                    && c.habit_ref() == Some(h.id.as_str())
                    && completion_day(c) == Some(today)
            })
        });
        if all_done {
            self.enqueue(CelebrationEvent {
                id: "daily-goal-complete".into(),
                title: "Daily Goal Achieved!".into(),
                body: "You've knocked out every habit today. See you tomorrow!".into(),
                button_text: "Great!".into(),
                icon: CelebrationIcon::Sun,
            });
        }
    }
}
