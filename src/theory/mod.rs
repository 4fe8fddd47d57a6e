//! Pure music-theory engine: pitch classes, scales, intervals and answer
//! checking. No I/O and no shared state; safe to call from anywhere.

mod interval;
mod pitch;
mod scale;

pub use interval::{
    build_interval, find_interval, identify_interval, Direction, IntervalDefinition, INTERVALS,
};
pub use pitch::{PitchClass, TheoryError, CHROMATIC};
pub use scale::{
    build_scale, find_scale, scale_for, scales_by_difficulty, Difficulty, Scale,
    ScaleDefinition, ScaleDifficultyTiers, ScaleKind, MAJOR_SCALES, MAJOR_STEPS, MINOR_SCALES,
    MINOR_STEPS,
};

use std::collections::HashSet;

/// Scores a submitted answer against the expected notes.
///
/// Both sequences are raw spellings from the caller; each is parsed at this
/// boundary and compared under enharmonic normalization, so "Db" matches
/// "C#". With `order_matters` the comparison is position by position
/// (practice mode); without it the two sequences must be equal as sets
/// (learn mode / interval-pair selection).
///
/// Any unrecognized spelling on either side fails with a typed error rather
/// than scoring the answer wrong.
pub fn check_answer(
    user_answer: &[String],
    correct_answer: &[String],
    order_matters: bool,
) -> Result<bool, TheoryError> {
    let user = parse_all(user_answer)?;
    let correct = parse_all(correct_answer)?;

    if user.len() != correct.len() {
        return Ok(false);
    }

    if order_matters {
        Ok(user == correct)
    } else {
        let user_set: HashSet<PitchClass> = user.iter().copied().collect();
        let correct_set: HashSet<PitchClass> = correct.iter().copied().collect();
        Ok(user_set == correct_set)
    }
}

fn parse_all(spellings: &[String]) -> Result<Vec<PitchClass>, TheoryError> {
    spellings.iter().map(|s| s.parse()).collect()
}
