//! Canonical pitch-class representation
//!
//! The whole engine works on a closed 12-pitch-class domain. Raw note
//! spellings (including the five flat spellings accepted as input) are parsed
//! into `PitchClass` exactly once at the boundary; everything downstream is
//! plain enum arithmetic on the chromatic circle.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TheoryError {
    /// The spelling is not one of the 17 recognized note names.
    #[error("unknown pitch spelling: {0:?}")]
    UnknownPitch(String),

    /// The name does not match any entry of the interval catalog. Callers
    /// are expected to validate against the catalog, so this is a
    /// programming-error class failure.
    #[error("unknown interval name: {0:?}")]
    UnknownInterval(String),
}

/// One of the 12 pitch classes, indexed 0-11 on the chromatic circle
/// starting at C. Display uses the canonical sharp spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

use PitchClass::*;

/// All 12 pitch classes in chromatic order.
pub const CHROMATIC: [PitchClass; 12] =
    [C, CSharp, D, DSharp, E, F, FSharp, G, GSharp, A, ASharp, B];

impl PitchClass {
    /// Position on the chromatic circle, 0-11.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Pitch class at the given circle position. Total: any integer wraps
    /// into 0-11, negatives included.
    pub fn from_index(index: i32) -> Self {
        CHROMATIC[index.rem_euclid(12) as usize]
    }

    /// Moves up (positive) or down (negative) by the given number of
    /// semitones, wrapping around the octave.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones)
    }

    /// Canonical sharp spelling.
    pub fn sharp_name(self) -> &'static str {
        match self {
            C => "C",
            CSharp => "C#",
            D => "D",
            DSharp => "D#",
            E => "E",
            F => "F",
            FSharp => "F#",
            G => "G",
            GSharp => "G#",
            A => "A",
            ASharp => "A#",
            B => "B",
        }
    }

    /// Flat spelling of the same pitch class. Naturals keep their plain name.
    pub fn flat_name(self) -> &'static str {
        match self {
            CSharp => "Db",
            DSharp => "Eb",
            FSharp => "Gb",
            GSharp => "Ab",
            ASharp => "Bb",
            other => other.sharp_name(),
        }
    }

    /// Spelling to display in a given key context.
    pub fn spelled(self, use_flats: bool) -> &'static str {
        if use_flats {
            self.flat_name()
        } else {
            self.sharp_name()
        }
    }
}

impl FromStr for PitchClass {
    type Err = TheoryError;

    /// Accepts the 12 sharp/natural spellings plus the 5 flat spellings.
    /// Anything else is out of contract and rejected with a typed error,
    /// never silently mapped to a default pitch.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pitch = match s {
            "C" => C,
            "C#" => CSharp,
            "Db" => CSharp,
            "D" => D,
            "D#" => DSharp,
            "Eb" => DSharp,
            "E" => E,
            "F" => F,
            "F#" => FSharp,
            "Gb" => FSharp,
            "G" => G,
            "G#" => GSharp,
            "Ab" => GSharp,
            "A" => A,
            "A#" => ASharp,
            "Bb" => ASharp,
            "B" => B,
            _ => return Err(TheoryError::UnknownPitch(s.to_owned())),
        };
        Ok(pitch)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}
