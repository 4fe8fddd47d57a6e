//! Interval catalog, construction and identification

use serde::{Deserialize, Serialize};

use super::pitch::{PitchClass, TheoryError};
use super::scale::Difficulty;

/// One entry of the static interval catalog.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalDefinition {
    pub name: &'static str,
    /// Semitone distance, 0-12.
    pub semitones: u8,
    pub short: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
}

/// The 13 canonical intervals, unison through octave.
pub const INTERVALS: [IntervalDefinition; 13] = [
    interval("Perfect Unison", 0, "P1", "The same note played twice", Difficulty::Easy),
    interval("Minor 2nd", 1, "m2", "One half step, the smallest interval", Difficulty::Medium),
    interval("Major 2nd", 2, "M2", "One whole step, as between the first two scale notes", Difficulty::Easy),
    interval("Minor 3rd", 3, "m3", "Three half steps, the dark-sounding third", Difficulty::Medium),
    interval("Major 3rd", 4, "M3", "Four half steps, the bright-sounding third", Difficulty::Easy),
    interval("Perfect 4th", 5, "P4", "Five half steps, as in 'Here Comes the Bride'", Difficulty::Easy),
    interval("Tritone", 6, "TT", "Six half steps, exactly half the octave", Difficulty::Hard),
    interval("Perfect 5th", 7, "P5", "Seven half steps, the most stable interval after the octave", Difficulty::Easy),
    interval("Minor 6th", 8, "m6", "Eight half steps", Difficulty::Hard),
    interval("Major 6th", 9, "M6", "Nine half steps, as in the NBC chime", Difficulty::Medium),
    interval("Minor 7th", 10, "m7", "Ten half steps, the dominant-seventh color", Difficulty::Hard),
    interval("Major 7th", 11, "M7", "Eleven half steps, one short of the octave", Difficulty::Hard),
    interval("Perfect Octave", 12, "P8", "Twelve half steps, the same note an octave up", Difficulty::Easy),
];

const fn interval(
    name: &'static str,
    semitones: u8,
    short: &'static str,
    description: &'static str,
    difficulty: Difficulty,
) -> IntervalDefinition {
    IntervalDefinition {
        name,
        semitones,
        short,
        description,
        difficulty,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

lazy_static::lazy_static! {
    static ref INTERVALS_BY_NAME: std::collections::HashMap<&'static str, &'static IntervalDefinition> =
        INTERVALS.iter().map(|def| (def.name, def)).collect();
}

/// Catalog lookup by exact interval name.
pub fn find_interval(name: &str) -> Option<&'static IntervalDefinition> {
    INTERVALS_BY_NAME.get(name).copied()
}

/// Builds the pitch class reached by moving the named interval up or down
/// from the start note, wrapping around the octave.
///
/// An unrecognized interval name is a hard error: callers must validate
/// against the catalog first or handle the failure.
pub fn build_interval(
    start: PitchClass,
    interval_name: &str,
    direction: Direction,
) -> Result<PitchClass, TheoryError> {
    let definition = find_interval(interval_name)
        .ok_or_else(|| TheoryError::UnknownInterval(interval_name.to_owned()))?;
    let semitones = definition.semitones as i32;
    Ok(match direction {
        Direction::Up => start.transpose(semitones),
        Direction::Down => start.transpose(-semitones),
    })
}

/// Identifies the interval between two notes from their unsigned mod-12
/// semitone distance. Returns the first catalog entry at that distance; the
/// octave entry (12 semitones) is unreachable here since the distance is
/// always 0-11, so a unison and an octave identify identically.
pub fn identify_interval(start: PitchClass, end: PitchClass) -> Option<&'static IntervalDefinition> {
    let distance = (end.index() as i32 - start.index() as i32).rem_euclid(12) as u8;
    INTERVALS.iter().find(|def| def.semitones == distance)
}
