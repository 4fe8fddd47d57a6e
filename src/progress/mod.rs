//! Per-user progress tracking: item mastery, the exercise session log and
//! the learning-journey gate.

pub mod models;
mod sqlite_store;
mod store;
pub mod tracker;

pub use models::{
    AccuracySummary, Category, ExerciseSession, JourneySection, JourneyStep, LearningProgress,
    MasteryStatus, ProgressRecord, ProgressSummary, StepAccess, JOURNEY_STEPS,
};
pub use sqlite_store::SqliteTrainingStore;
pub use store::{JourneyStore, ProgressStore, SessionStore, TrainingStore};
