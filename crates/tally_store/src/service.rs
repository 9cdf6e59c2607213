//! Application service tying the record store, streak engine, and
//! celebration evaluator together.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};

use tally_core::calendar::{today_local, WeekStartDay};
use tally_core::celebration::{CelebrationEvaluator, CelebrationEvent};
use tally_core::completion::{completion_day, completion_days_for_habit};
use tally_core::habit::{CompletionRecord, Habit};
use tally_core::streak::{recompute_streak, StreakResult};

use crate::settings::{self, Settings};
use crate::store::RecordStore;

const HABIT_ENTITY: &str = "UserHabit";
const COMPLETION_ENTITY: &str = "HabitCompletion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Created,
    Removed,
}

/// What one completion toggle produced.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    pub streak: StreakResult,
    pub celebrations: Vec<CelebrationEvent>,
}

pub struct HabitTracker {
    store: Box<dyn RecordStore>,
    settings: Settings,
    settings_path: Option<PathBuf>,
    evaluator: CelebrationEvaluator,
}

pub struct HabitTrackerBuilder {
    store: Option<Box<dyn RecordStore>>,
    settings_path: Option<PathBuf>,
}

impl HabitTrackerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            settings_path: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Where the settings collaborator lives. Without a path the tracker
    /// keeps settings in memory only.
    pub fn with_settings_path(mut self, path: impl AsRef<Path>) -> Self {
        self.settings_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<HabitTracker> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("a record store is required"))?;
        let settings = self
            .settings_path
            .as_deref()
            .map(settings::load)
            .unwrap_or_default();
        let mut evaluator = CelebrationEvaluator::new();
        evaluator.load_state(settings.seen_milestones.iter().cloned());
        Ok(HabitTracker {
            store,
            settings,
            settings_path: self.settings_path,
            evaluator,
        })
    }
}

impl Default for HabitTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitTracker {
    pub fn builder() -> HabitTrackerBuilder {
        HabitTrackerBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn week_start_day(&self) -> WeekStartDay {
        WeekStartDay::from_setting(&self.settings.week_start)
    }

    pub fn set_week_start(&mut self, week_start: &str) {
        self.settings.week_start = week_start.to_string();
        self.persist_settings();
    }

    pub fn create_habit(
        &self,
        name: &str,
        emoji: Option<&str>,
        frequency: u32,
        created: NaiveDate,
    ) -> Result<Habit> {
        let stored = self.store.create(
            HABIT_ENTITY,
            json!({
                "name": name,
                "emoji": emoji,
                "frequency": frequency,
                "created_date": created.to_string(),
            }),
        )?;
        Ok(serde_json::from_value(stored)?)
    }

    pub fn habits(&self) -> Result<Vec<Habit>> {
        Self::decode(self.store.list(HABIT_ENTITY)?)
    }

    pub fn completions(&self) -> Result<Vec<CompletionRecord>> {
        Self::decode(self.store.list(COMPLETION_ENTITY)?)
    }

    /// Current streak state for one habit, as of today.
    pub fn streak_for(&self, habit_id: &str) -> Result<StreakResult> {
        self.streak_for_at(habit_id, today_local())
    }

    pub fn streak_for_at(&self, habit_id: &str, today: NaiveDate) -> Result<StreakResult> {
        let habit = self.habit(habit_id)?;
        let days = completion_days_for_habit(habit_id, &self.completions()?);
        Ok(recompute_streak(
            &habit,
            &days,
            self.week_start_day(),
            Some(today),
        ))
    }

    /// Marks or un-marks `habit_id` for `day`. Creating a completion runs the
    /// celebration check exactly once; removing one only recomputes the
    /// streak. Takes `&mut self` because the evaluator's seen-set is read and
    /// then written: toggles for one tracker must not interleave.
    pub fn toggle_completion(&mut self, habit_id: &str, day: NaiveDate) -> Result<ToggleOutcome> {
        self.toggle_completion_at(habit_id, day, today_local())
    }

    pub fn toggle_completion_at(
        &mut self,
        habit_id: &str,
        day: NaiveDate,
        today: NaiveDate,
    ) -> Result<ToggleOutcome> {
        let habit = self.habit(habit_id)?;
        let existing = self.completions()?.into_iter().find(|c| {
            c.completed && c.habit_ref() == Some(habit_id) && completion_day(c) == Some(day)
        });

        if let Some(record) = existing {
            self.store.delete(COMPLETION_ENTITY, &record.id)?;
            tracing::debug!(habit = habit_id, %day, "completion removed");
            return Ok(ToggleOutcome {
                action: ToggleAction::Removed,
                streak: self.streak_for_at(habit_id, today)?,
                celebrations: Vec::new(),
            });
        }

        // The new record is appended last; the evaluator's old/new streak
        // delta depends on that ordering.
        self.store.create(
            COMPLETION_ENTITY,
            json!({
                "user_habit_id": habit_id,
                "completion_date": day.to_string(),
                "completed": true,
            }),
        )?;
        tracing::debug!(habit = habit_id, %day, "completion created");

        let habits = self.habits()?;
        let all_completions = self.completions()?;
        let outcome = self.evaluator.check_at(
            &habit,
            &habits,
            &all_completions,
            &self.settings.week_start,
            today,
        );

        if let Some(best) = outcome.personal_best {
            if let Err(err) = self.store.update(
                HABIT_ENTITY,
                habit_id,
                json!({ "personal_best_streak": best }),
            ) {
                tracing::warn!(habit = habit_id, %err, "failed to record personal best");
            }
        }

        self.settings.seen_milestones = self.evaluator.seen_milestones();
        self.persist_settings();

        Ok(ToggleOutcome {
            action: ToggleAction::Created,
            streak: self.streak_for_at(habit_id, today)?,
            celebrations: outcome.events,
        })
    }

    /// Removes a habit and every completion it owns.
    pub fn delete_habit(&self, habit_id: &str) -> Result<()> {
        for record in self.completions()? {
            if record.habit_ref() == Some(habit_id) {
                self.store.delete(COMPLETION_ENTITY, &record.id)?;
            }
        }
        self.store.delete(HABIT_ENTITY, habit_id)?;
        Ok(())
    }

    fn habit(&self, habit_id: &str) -> Result<Habit> {
        self.habits()?
            .into_iter()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| anyhow!("habit not found: {habit_id}"))
    }

    fn decode<T: serde::de::DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
        records
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(Into::into))
            .collect()
    }

    // Best effort: a persistence failure must never fail the toggle itself.
    fn persist_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(err) = settings::save(path, &self.settings) {
                tracing::warn!(path = %path.display(), %err, "failed to persist settings");
            }
        }
    }
}
