//! Mastery transition rule, summary aggregation and journey gating
//!
//! Everything here is pure; the stores call into these functions while
//! holding their connection lock so read-modify-write cycles cannot race.

use std::collections::HashMap;

use super::models::{
    Category, LearningProgress, MasteryStatus, ProgressRecord, ProgressSummary, StepAccess,
    JOURNEY_STEPS,
};
use crate::theory::{INTERVALS, MAJOR_SCALES, MINOR_SCALES};

/// Correct answers required before an item counts as mastered.
pub const MASTERY_THRESHOLD: u32 = 3;

/// Total number of trackable items, derived from the static catalogs so it
/// stays consistent if they change.
pub fn total_trackable_items() -> usize {
    MAJOR_SCALES.len() + MINOR_SCALES.len() + INTERVALS.len()
}

/// True when the item name exists in the category's static catalog. Only
/// cataloged items may accumulate progress, otherwise the summary counts
/// would drift from the catalog totals.
pub fn known_item(category: Category, item_name: &str) -> bool {
    match category {
        Category::MajorScales => MAJOR_SCALES.iter().any(|def| def.name == item_name),
        Category::MinorScales => MINOR_SCALES.iter().any(|def| def.name == item_name),
        Category::Intervals => INTERVALS.iter().any(|def| def.name == item_name),
    }
}

/// Applies one attempt to a record in place.
///
/// The status is recomputed from scratch on every attempt: mastered requires
/// this attempt to be correct with the threshold reached, anything else with
/// at least one attempt is in-progress. A miss after mastery therefore
/// demotes the item back to in-progress; counters never reset.
pub fn apply_attempt(record: &mut ProgressRecord, correct: bool, now: i64) {
    record.attempts += 1;
    if correct {
        record.correct_answers += 1;
    }
    record.status = if correct && record.correct_answers >= MASTERY_THRESHOLD {
        MasteryStatus::Mastered
    } else {
        MasteryStatus::InProgress
    };
    record.last_practiced = now;
    if record.status == MasteryStatus::Mastered && record.mastered_at.is_none() {
        record.mastered_at = Some(now);
    }
}

/// Aggregates stored records into the overall summary. Items without a
/// record were never attempted and are counted as not-started by
/// subtraction.
pub fn summarize(records: &[ProgressRecord]) -> ProgressSummary {
    let total_items = total_trackable_items();
    let mastered = records
        .iter()
        .filter(|r| r.status == MasteryStatus::Mastered)
        .count();
    let in_progress = records
        .iter()
        .filter(|r| r.status == MasteryStatus::InProgress)
        .count();
    // Records for uncataloged items are rejected upstream; clamp anyway so a
    // hand-edited database cannot underflow the count.
    let not_started = total_items.saturating_sub(mastered + in_progress);
    let overall_progress = ((mastered as f64 / total_items as f64) * 100.0).round() as u8;

    ProgressSummary {
        total_items,
        mastered,
        in_progress,
        not_started,
        overall_progress,
    }
}

fn completed_sections_by_step(records: &[LearningProgress]) -> HashMap<u8, u8> {
    let mut counts: HashMap<u8, u8> = HashMap::new();
    for record in records.iter().filter(|r| r.completed) {
        *counts.entry(record.step_id).or_default() += 1;
    }
    counts
}

/// Computes the gate for every journey step from a user's stored records.
///
/// Step 1 is always accessible; step N requires every earlier step to have
/// all three sections completed, so a single gap blocks everything after it.
pub fn step_access_table(records: &[LearningProgress]) -> Vec<StepAccess> {
    let completed = completed_sections_by_step(records);
    let mut prefix_complete = true;
    JOURNEY_STEPS
        .iter()
        .map(|step| {
            let accessible = prefix_complete;
            let completed_sections = completed.get(&step.id).copied().unwrap_or(0);
            prefix_complete = prefix_complete && completed_sections >= 3;
            StepAccess {
                step_id: step.id,
                accessible,
                completed_sections,
            }
        })
        .collect()
}

/// Gate check for one step.
pub fn is_step_accessible(records: &[LearningProgress], step_id: u8) -> bool {
    step_access_table(records)
        .iter()
        .find(|access| access.step_id == step_id)
        .map(|access| access.accessible)
        .unwrap_or(false)
}
