pub mod service;
pub mod settings;
pub mod store;

pub use crate::service::{HabitTracker, HabitTrackerBuilder, ToggleAction, ToggleOutcome};
pub use crate::store::{MemoryStore, RecordStore, StoreError};
