//! Sort-value scoring for daily tasks.
//!
//! Tasks on the to-do tabs are ordered by a priority-per-cost score: the
//! higher the priority and the cheaper the task, the earlier it sorts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    fn value(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effort {
    S,
    M,
    L,
    Xl,
}

impl Effort {
    fn value(self) -> f64 {
        match self {
            Self::S => 1.0,
            Self::M => 2.0,
            Self::L => 3.0,
            Self::Xl => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeEstimate {
    #[serde(rename = "15m")]
    QuarterHour,
    #[serde(rename = "30m")]
    HalfHour,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1.5h")]
    HourAndAHalf,
}

impl TimeEstimate {
    fn value(self) -> f64 {
        match self {
            Self::QuarterHour => 0.25,
            Self::HalfHour => 0.5,
            Self::Hour => 1.0,
            Self::HourAndAHalf => 1.5,
        }
    }
}

/// Which cost axis divides the priority, a per-user setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CapacityMode {
    #[default]
    Effort,
    #[serde(rename = "Estimated Time")]
    EstimatedTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tab_id: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub effort: Option<Effort>,
    #[serde(default)]
    pub time_estimation: Option<TimeEstimate>,
    #[serde(default)]
    pub completed: bool,
}

// Unset fields take the pessimistic defaults: lowest priority, largest cost.
const DEFAULT_PRIORITY: f64 = 1.0;
const DEFAULT_EFFORT: f64 = 4.0;
const DEFAULT_TIME: f64 = 1.5;

/// Priority divided by the selected cost axis. Higher sorts first.
pub fn sort_value(task: &Task, mode: CapacityMode) -> f64 {
    let priority = task.priority.map_or(DEFAULT_PRIORITY, Priority::value);
    let denominator = match mode {
        CapacityMode::Effort => task.effort.map_or(DEFAULT_EFFORT, Effort::value),
        CapacityMode::EstimatedTime => task
            .time_estimation
            .map_or(DEFAULT_TIME, TimeEstimate::value),
    };
    priority / denominator
}
