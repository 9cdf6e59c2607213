pub mod calendar;
pub mod celebration;
pub mod completion;
pub mod habit;
pub mod streak;
pub mod task;

pub use crate::celebration::{CelebrationEvaluator, CelebrationEvent, CheckOutcome};
pub use crate::streak::{calculate_habit_streak, recompute_streak, StreakResult};
