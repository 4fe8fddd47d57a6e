//! Progress-tracking data models

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressModelError {
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),
    #[error("unknown journey section: {0:?}")]
    UnknownSection(String),
}

/// The three trackable exercise categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MajorScales,
    MinorScales,
    Intervals,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::MajorScales, Category::MinorScales, Category::Intervals];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::MajorScales => "major_scales",
            Category::MinorScales => "minor_scales",
            Category::Intervals => "intervals",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = ProgressModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major_scales" => Ok(Category::MajorScales),
            "minor_scales" => Ok(Category::MinorScales),
            "intervals" => Ok(Category::Intervals),
            _ => Err(ProgressModelError::UnknownCategory(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    NotStarted,
    InProgress,
    Mastered,
}

impl MasteryStatus {
    pub fn to_int(self) -> i32 {
        match self {
            MasteryStatus::NotStarted => 0,
            MasteryStatus::InProgress => 1,
            MasteryStatus::Mastered => 2,
        }
    }

    pub fn from_int(value: i32) -> Self {
        match value {
            2 => MasteryStatus::Mastered,
            1 => MasteryStatus::InProgress,
            _ => MasteryStatus::NotStarted,
        }
    }
}

/// Per (user, category, item) mastery record. Created on the first attempt,
/// merged on every later one, never deleted.
///
/// Invariants: `correct_answers <= attempts`; `Mastered` implies
/// `correct_answers` reached the mastery threshold and `mastered_at` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressRecord {
    pub user_id: i64,
    pub category: Category,
    pub item_name: String,
    pub status: MasteryStatus,
    pub attempts: u32,
    pub correct_answers: u32,
    /// Unix seconds of the latest attempt.
    pub last_practiced: i64,
    /// Unix seconds of the first transition into mastered, if any.
    pub mastered_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub total_items: usize,
    pub mastered: usize,
    pub in_progress: usize,
    pub not_started: usize,
    /// Percentage of mastered items, rounded to the nearest integer.
    pub overall_progress: u8,
}

/// One completed exercise attempt, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub id: Option<i64>,
    pub user_id: i64,
    pub category: Category,
    pub item_name: String,
    pub is_correct: bool,
    pub user_answer: Vec<String>,
    pub correct_answer: Vec<String>,
    pub time_to_complete_secs: u32,
    /// Unix seconds; filled by the store on insert when absent.
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccuracySummary {
    pub total: u64,
    pub correct: u64,
    /// Rounded percentage; 0 when there are no sessions.
    pub accuracy_percent: u8,
}

/// The three sections of every learning-journey step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneySection {
    Learn,
    Practice,
    Test,
}

impl JourneySection {
    pub const ALL: [JourneySection; 3] =
        [JourneySection::Learn, JourneySection::Practice, JourneySection::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            JourneySection::Learn => "learn",
            JourneySection::Practice => "practice",
            JourneySection::Test => "test",
        }
    }
}

impl std::str::FromStr for JourneySection {
    type Err = ProgressModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learn" => Ok(JourneySection::Learn),
            "practice" => Ok(JourneySection::Practice),
            "test" => Ok(JourneySection::Test),
            _ => Err(ProgressModelError::UnknownSection(s.to_owned())),
        }
    }
}

/// Per (user, step, section) completion state.
#[derive(Debug, Clone, Serialize)]
pub struct LearningProgress {
    pub user_id: i64,
    pub step_id: u8,
    pub section: JourneySection,
    pub completed: bool,
    /// Best score recorded for the section, if any was reported.
    pub score: Option<u32>,
    pub attempts: u32,
}

/// Static description of a journey step, served to the UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JourneyStep {
    pub id: u8,
    pub title: &'static str,
    pub summary: &'static str,
}

pub const JOURNEY_STEPS: [JourneyStep; 7] = [
    JourneyStep {
        id: 1,
        title: "The musical alphabet",
        summary: "The seven letter names and where they sit on the keyboard",
    },
    JourneyStep {
        id: 2,
        title: "Sharps and flats",
        summary: "The black keys, accidentals and enharmonic spellings",
    },
    JourneyStep {
        id: 3,
        title: "Whole and half steps",
        summary: "Measuring distance on the chromatic circle",
    },
    JourneyStep {
        id: 4,
        title: "Major scales",
        summary: "Building any major scale from the whole-half pattern",
    },
    JourneyStep {
        id: 5,
        title: "Minor scales",
        summary: "The natural minor pattern and relative keys",
    },
    JourneyStep {
        id: 6,
        title: "Intervals",
        summary: "Naming and building the thirteen canonical intervals",
    },
    JourneyStep {
        id: 7,
        title: "Putting it together",
        summary: "Mixed drills across scales and intervals",
    },
];

/// Gate answer for a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepAccess {
    pub step_id: u8,
    pub accessible: bool,
    /// How many of the step's three sections are completed.
    pub completed_sections: u8,
}
