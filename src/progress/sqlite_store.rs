use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::sqlite_persistence::VersionedSchema;

use super::models::{
    AccuracySummary, Category, ExerciseSession, JourneySection, LearningProgress, MasteryStatus,
    ProgressRecord, ProgressSummary, StepAccess,
};
use super::store::{JourneyStore, ProgressStore, SessionStore};
use super::tracker;

const SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    create_statements: &[
        "CREATE TABLE item_progress (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            item_name TEXT NOT NULL,
            status INTEGER NOT NULL,
            attempts INTEGER NOT NULL,
            correct_answers INTEGER NOT NULL,
            last_practiced INTEGER NOT NULL,
            mastered_at INTEGER,
            UNIQUE (user_id, category, item_name)
        )",
        "CREATE INDEX idx_item_progress_user ON item_progress (user_id)",
        "CREATE TABLE exercise_session (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            item_name TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            user_answer TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            time_to_complete_secs INTEGER NOT NULL,
            created INTEGER NOT NULL
        )",
        "CREATE INDEX idx_exercise_session_user ON exercise_session (user_id, created)",
        "CREATE TABLE learning_progress (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            step_id INTEGER NOT NULL,
            section TEXT NOT NULL,
            completed INTEGER NOT NULL,
            score INTEGER,
            attempts INTEGER NOT NULL,
            UNIQUE (user_id, step_id, section)
        )",
    ],
    migrations: &[],
};

/// SQLite-backed training store. All operations go through one guarded
/// connection; an attempt's read-modify-write happens inside a single lock
/// hold, which serializes racing updates on the same progress key.
pub struct SqliteTrainingStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTrainingStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let connection = Connection::open(&db_path)
            .with_context(|| format!("opening training db at {:?}", db_path.as_ref()))?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        SCHEMA.initialize(&connection)?;
        info!("Training store ready at {:?}", db_path.as_ref());
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Parses a TEXT column written via the enum's `as_str`. A value that no
/// longer parses means the stored data is corrupt; that surfaces as a
/// conversion error, never a default.
fn stored_enum<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index(column).unwrap_or_default(),
            Type::Text,
            Box::new(err),
        )
    })
}

fn progress_record_from_row(row: &Row) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        user_id: row.get("user_id")?,
        category: stored_enum(row, "category")?,
        item_name: row.get("item_name")?,
        status: MasteryStatus::from_int(row.get("status")?),
        attempts: row.get("attempts")?,
        correct_answers: row.get("correct_answers")?,
        last_practiced: row.get("last_practiced")?,
        mastered_at: row.get("mastered_at")?,
    })
}

impl ProgressStore for SqliteTrainingStore {
    fn record_attempt(
        &self,
        user_id: i64,
        category: Category,
        item_name: &str,
        correct: bool,
    ) -> Result<ProgressRecord> {
        let conn = self.connection.lock().unwrap();

        let mut record = conn
            .query_row(
                "SELECT user_id, category, item_name, status, attempts, correct_answers,
                        last_practiced, mastered_at
                 FROM item_progress
                 WHERE user_id = ?1 AND category = ?2 AND item_name = ?3",
                params![user_id, category.as_str(), item_name],
                |row| progress_record_from_row(row),
            )
            .optional()
            .context("loading progress record")?
            .unwrap_or(ProgressRecord {
                user_id,
                category,
                item_name: item_name.to_owned(),
                status: MasteryStatus::NotStarted,
                attempts: 0,
                correct_answers: 0,
                last_practiced: 0,
                mastered_at: None,
            });

        tracker::apply_attempt(&mut record, correct, Self::now());

        conn.execute(
            "INSERT INTO item_progress
                 (user_id, category, item_name, status, attempts, correct_answers,
                  last_practiced, mastered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (user_id, category, item_name) DO UPDATE SET
                 status = excluded.status,
                 attempts = excluded.attempts,
                 correct_answers = excluded.correct_answers,
                 last_practiced = excluded.last_practiced,
                 mastered_at = excluded.mastered_at",
            params![
                user_id,
                category.as_str(),
                item_name,
                record.status.to_int(),
                record.attempts,
                record.correct_answers,
                record.last_practiced,
                record.mastered_at,
            ],
        )
        .context("upserting progress record")?;

        Ok(record)
    }

    fn get_user_progress(&self, user_id: i64) -> Result<Vec<ProgressRecord>> {
        let conn = self.connection.lock().unwrap();
        let mut statement = conn.prepare(
            "SELECT user_id, category, item_name, status, attempts, correct_answers,
                    last_practiced, mastered_at
             FROM item_progress WHERE user_id = ?1
             ORDER BY category, item_name",
        )?;
        let records = statement
            .query_map(params![user_id], |row| progress_record_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn get_category_progress(
        &self,
        user_id: i64,
        category: Category,
    ) -> Result<Vec<ProgressRecord>> {
        let conn = self.connection.lock().unwrap();
        let mut statement = conn.prepare(
            "SELECT user_id, category, item_name, status, attempts, correct_answers,
                    last_practiced, mastered_at
             FROM item_progress WHERE user_id = ?1 AND category = ?2
             ORDER BY item_name",
        )?;
        let records = statement
            .query_map(params![user_id, category.as_str()], |row| {
                progress_record_from_row(row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn get_progress_summary(&self, user_id: i64) -> Result<ProgressSummary> {
        Ok(tracker::summarize(&self.get_user_progress(user_id)?))
    }
}

impl SessionStore for SqliteTrainingStore {
    fn append_session(&self, session: ExerciseSession) -> Result<i64> {
        let conn = self.connection.lock().unwrap();
        let created = if session.created_at > 0 {
            session.created_at
        } else {
            Self::now()
        };
        conn.execute(
            "INSERT INTO exercise_session
                 (user_id, category, item_name, is_correct, user_answer, correct_answer,
                  time_to_complete_secs, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.user_id,
                session.category.as_str(),
                session.item_name,
                session.is_correct,
                serde_json::to_string(&session.user_answer)?,
                serde_json::to_string(&session.correct_answer)?,
                session.time_to_complete_secs,
                created,
            ],
        )
        .context("appending exercise session")?;
        Ok(conn.last_insert_rowid())
    }

    fn get_user_sessions(
        &self,
        user_id: i64,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ExerciseSession>> {
        let conn = self.connection.lock().unwrap();

        let map_row = |row: &Row| -> rusqlite::Result<(ExerciseSession, String, String)> {
            let session = ExerciseSession {
                id: Some(row.get("id")?),
                user_id: row.get("user_id")?,
                category: stored_enum(row, "category")?,
                item_name: row.get("item_name")?,
                is_correct: row.get("is_correct")?,
                user_answer: Vec::new(),
                correct_answer: Vec::new(),
                time_to_complete_secs: row.get("time_to_complete_secs")?,
                created_at: row.get("created")?,
            };
            Ok((session, row.get("user_answer")?, row.get("correct_answer")?))
        };

        let rows = match category {
            Some(category) => {
                let mut statement = conn.prepare(
                    "SELECT * FROM exercise_session
                     WHERE user_id = ?1 AND category = ?2
                     ORDER BY created DESC, id DESC LIMIT ?3",
                )?;
                let rows = statement
                    .query_map(params![user_id, category.as_str(), limit], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut statement = conn.prepare(
                    "SELECT * FROM exercise_session
                     WHERE user_id = ?1
                     ORDER BY created DESC, id DESC LIMIT ?2",
                )?;
                let rows = statement
                    .query_map(params![user_id, limit], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        rows.into_iter()
            .map(|(mut session, user_answer, correct_answer)| {
                session.user_answer = serde_json::from_str(&user_answer)
                    .context("decoding stored user answer")?;
                session.correct_answer = serde_json::from_str(&correct_answer)
                    .context("decoding stored correct answer")?;
                Ok(session)
            })
            .collect()
    }

    fn get_accuracy(&self, user_id: i64, category: Option<Category>) -> Result<AccuracySummary> {
        let conn = self.connection.lock().unwrap();
        let (total, correct): (u64, u64) = match category {
            Some(category) => conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_correct), 0)
                 FROM exercise_session WHERE user_id = ?1 AND category = ?2",
                params![user_id, category.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_correct), 0)
                 FROM exercise_session WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
        };
        let accuracy_percent = if total == 0 {
            0
        } else {
            ((correct as f64 / total as f64) * 100.0).round() as u8
        };
        Ok(AccuracySummary {
            total,
            correct,
            accuracy_percent,
        })
    }
}

fn learning_progress_from_row(row: &Row) -> rusqlite::Result<LearningProgress> {
    Ok(LearningProgress {
        user_id: row.get("user_id")?,
        step_id: row.get("step_id")?,
        section: stored_enum(row, "section")?,
        completed: row.get("completed")?,
        score: row.get("score")?,
        attempts: row.get("attempts")?,
    })
}

impl JourneyStore for SqliteTrainingStore {
    fn complete_section(
        &self,
        user_id: i64,
        step_id: u8,
        section: JourneySection,
        score: Option<u32>,
    ) -> Result<LearningProgress> {
        let conn = self.connection.lock().unwrap();
        // Re-completion bumps attempts and keeps the best reported score
        conn.execute(
            "INSERT INTO learning_progress (user_id, step_id, section, completed, score, attempts)
             VALUES (?1, ?2, ?3, 1, ?4, 1)
             ON CONFLICT (user_id, step_id, section) DO UPDATE SET
                 completed = 1,
                 attempts = attempts + 1,
                 score = CASE
                     WHEN excluded.score IS NULL THEN score
                     WHEN score IS NULL THEN excluded.score
                     ELSE MAX(score, excluded.score)
                 END",
            params![user_id, step_id, section.as_str(), score],
        )
        .context("upserting learning progress")?;

        let record = conn.query_row(
            "SELECT user_id, step_id, section, completed, score, attempts
             FROM learning_progress
             WHERE user_id = ?1 AND step_id = ?2 AND section = ?3",
            params![user_id, step_id, section.as_str()],
            learning_progress_from_row,
        )?;
        Ok(record)
    }

    fn get_learning_progress(&self, user_id: i64) -> Result<Vec<LearningProgress>> {
        let conn = self.connection.lock().unwrap();
        let mut statement = conn.prepare(
            "SELECT user_id, step_id, section, completed, score, attempts
             FROM learning_progress WHERE user_id = ?1
             ORDER BY step_id, section",
        )?;
        let records = statement
            .query_map(params![user_id], learning_progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn get_step_access(&self, user_id: i64) -> Result<Vec<StepAccess>> {
        Ok(tracker::step_access_table(
            &self.get_learning_progress(user_id)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteTrainingStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteTrainingStore::new(dir.path().join("training.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn first_attempt_creates_a_record() {
        let (store, _dir) = create_tmp_store();
        let record = store
            .record_attempt(1, Category::MajorScales, "C Major", true)
            .unwrap();
        assert_eq!(record.attempts, 1);
        assert_eq!(record.correct_answers, 1);
        assert_eq!(record.status, MasteryStatus::InProgress);
        assert!(record.last_practiced > 0);
    }

    #[test]
    fn attempts_accumulate_to_mastery_and_persist() {
        let (store, _dir) = create_tmp_store();
        for _ in 0..3 {
            store
                .record_attempt(1, Category::Intervals, "Perfect 5th", true)
                .unwrap();
        }
        let records = store
            .get_category_progress(1, Category::Intervals)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, MasteryStatus::Mastered);
        assert!(records[0].mastered_at.is_some());

        // A miss demotes but keeps the mastery stamp
        let demoted = store
            .record_attempt(1, Category::Intervals, "Perfect 5th", false)
            .unwrap();
        assert_eq!(demoted.status, MasteryStatus::InProgress);
        assert_eq!(demoted.attempts, 4);
        assert!(demoted.mastered_at.is_some());
    }

    #[test]
    fn progress_is_isolated_per_user_and_item() {
        let (store, _dir) = create_tmp_store();
        store
            .record_attempt(1, Category::MajorScales, "C Major", true)
            .unwrap();
        store
            .record_attempt(1, Category::MajorScales, "G Major", false)
            .unwrap();
        store
            .record_attempt(2, Category::MajorScales, "C Major", true)
            .unwrap();

        assert_eq!(store.get_user_progress(1).unwrap().len(), 2);
        assert_eq!(store.get_user_progress(2).unwrap().len(), 1);
    }

    #[test]
    fn summary_counts_by_subtraction() {
        let (store, _dir) = create_tmp_store();
        for _ in 0..3 {
            store
                .record_attempt(1, Category::MinorScales, "A Minor", true)
                .unwrap();
        }
        store
            .record_attempt(1, Category::Intervals, "Tritone", false)
            .unwrap();

        let summary = store.get_progress_summary(1).unwrap();
        assert_eq!(summary.total_items, 37);
        assert_eq!(summary.mastered, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.not_started, 35);
    }

    #[test]
    fn sessions_are_append_only_and_queryable() {
        let (store, _dir) = create_tmp_store();
        let session = ExerciseSession {
            id: None,
            user_id: 1,
            category: Category::MajorScales,
            item_name: "C Major".to_owned(),
            is_correct: true,
            user_answer: vec!["C".into(), "D".into(), "E".into()],
            correct_answer: vec!["C".into(), "D".into(), "E".into()],
            time_to_complete_secs: 12,
            created_at: 0,
        };
        let first_id = store.append_session(session.clone()).unwrap();
        let mut wrong = session.clone();
        wrong.is_correct = false;
        wrong.category = Category::Intervals;
        store.append_session(wrong).unwrap();

        let all = store.get_user_sessions(1, None, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, Some(first_id));
        assert_eq!(all[1].user_answer, vec!["C", "D", "E"]);

        let intervals_only = store
            .get_user_sessions(1, Some(Category::Intervals), 10)
            .unwrap();
        assert_eq!(intervals_only.len(), 1);

        let accuracy = store.get_accuracy(1, None).unwrap();
        assert_eq!(accuracy.total, 2);
        assert_eq!(accuracy.correct, 1);
        assert_eq!(accuracy.accuracy_percent, 50);
    }

    #[test]
    fn section_completion_upserts() {
        let (store, _dir) = create_tmp_store();
        let first = store
            .complete_section(1, 1, JourneySection::Test, Some(70))
            .unwrap();
        assert!(first.completed);
        assert_eq!(first.attempts, 1);
        assert_eq!(first.score, Some(70));

        // Lower score on retry keeps the best, attempts bump
        let retry = store
            .complete_section(1, 1, JourneySection::Test, Some(55))
            .unwrap();
        assert_eq!(retry.attempts, 2);
        assert_eq!(retry.score, Some(70));

        let better = store
            .complete_section(1, 1, JourneySection::Test, Some(90))
            .unwrap();
        assert_eq!(better.score, Some(90));
    }

    #[test]
    fn corrupt_stored_category_is_an_error_not_a_default() {
        let (store, _dir) = create_tmp_store();
        store
            .record_attempt(1, Category::MajorScales, "C Major", true)
            .unwrap();
        {
            let conn = store.connection.lock().unwrap();
            conn.execute("UPDATE item_progress SET category = 'chords'", [])
                .unwrap();
        }
        assert!(store.get_user_progress(1).is_err());
    }

    #[test]
    fn corrupt_stored_section_is_an_error_not_a_default() {
        let (store, _dir) = create_tmp_store();
        store
            .complete_section(1, 1, JourneySection::Learn, None)
            .unwrap();
        {
            let conn = store.connection.lock().unwrap();
            conn.execute("UPDATE learning_progress SET section = 'quiz'", [])
                .unwrap();
        }
        assert!(store.get_learning_progress(1).is_err());
    }

    #[test]
    fn step_access_follows_completions() {
        let (store, _dir) = create_tmp_store();
        let access = store.get_step_access(1).unwrap();
        assert!(access[0].accessible);
        assert!(!access[1].accessible);

        for section in JourneySection::ALL {
            store.complete_section(1, 1, section, None).unwrap();
        }
        let access = store.get_step_access(1).unwrap();
        assert!(access[1].accessible);
        assert!(!access[2].accessible);
        assert_eq!(access[0].completed_sections, 3);
    }
}
