use super::models::{
    AccuracySummary, Category, ExerciseSession, JourneySection, LearningProgress, ProgressRecord,
    ProgressSummary, StepAccess,
};
use anyhow::Result;

/// Per-item mastery tracking.
pub trait ProgressStore: Send + Sync {
    /// Applies one exercise attempt to the (user, category, item) record,
    /// creating it on first contact, and returns the updated record.
    /// The read-modify-write must be serialized per key so concurrent
    /// attempts cannot lose updates.
    fn record_attempt(
        &self,
        user_id: i64,
        category: Category,
        item_name: &str,
        correct: bool,
    ) -> Result<ProgressRecord>;

    /// Returns all progress records for a user.
    /// Returns Err if there is a database error.
    fn get_user_progress(&self, user_id: i64) -> Result<Vec<ProgressRecord>>;

    /// Returns a user's progress records in one category.
    fn get_category_progress(&self, user_id: i64, category: Category)
        -> Result<Vec<ProgressRecord>>;

    /// Aggregates a user's records into the overall summary.
    fn get_progress_summary(&self, user_id: i64) -> Result<ProgressSummary>;
}

/// Append-only exercise session log.
pub trait SessionStore: Send + Sync {
    /// Appends a session entry and returns its id. `created_at` is stamped
    /// by the store when the entry carries none.
    fn append_session(&self, session: ExerciseSession) -> Result<i64>;

    /// Returns a user's sessions, newest first, optionally filtered by
    /// category and capped at `limit`.
    fn get_user_sessions(
        &self,
        user_id: i64,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ExerciseSession>>;

    /// Aggregates correct/total counts over a user's sessions.
    fn get_accuracy(&self, user_id: i64, category: Option<Category>) -> Result<AccuracySummary>;
}

/// Learning-journey completion tracking and gating.
pub trait JourneyStore: Send + Sync {
    /// Marks a step section completed (upsert: re-completion bumps attempts
    /// and keeps the best score) and returns the stored record.
    fn complete_section(
        &self,
        user_id: i64,
        step_id: u8,
        section: JourneySection,
        score: Option<u32>,
    ) -> Result<LearningProgress>;

    /// Returns all of a user's learning-progress records.
    fn get_learning_progress(&self, user_id: i64) -> Result<Vec<LearningProgress>>;

    /// Returns the gate state for every step, in order.
    fn get_step_access(&self, user_id: i64) -> Result<Vec<StepAccess>>;
}

/// Combined trait for the full training store.
pub trait TrainingStore: ProgressStore + SessionStore + JourneyStore {}

// Blanket implementation for any type implementing all three store traits
impl<T: ProgressStore + SessionStore + JourneyStore> TrainingStore for T {}
