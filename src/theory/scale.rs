//! Scale catalog and construction
//!
//! The 24 supported scales (12 major, 12 natural minor) are a static,
//! immutable catalog. A `Scale` with its actual note spellings is always
//! derived on demand from a definition, never stored, so the notes cannot
//! drift from the catalog. Flat-key scales (negative accidental count) are
//! spelled with flats, sharp keys with sharps, per circle-of-fifths
//! convention.

use serde::{Deserialize, Serialize};

use super::pitch::PitchClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    Minor,
}

impl ScaleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
        }
    }
}

/// One entry of the static scale catalog.
///
/// `accidentals` is the signed key-signature count (sharps positive, flats
/// negative); `fifths` is the position on the circle of fifths relative to
/// the accidental-free key of the same kind.
#[derive(Debug, Clone, Copy)]
pub struct ScaleDefinition {
    pub name: &'static str,
    pub tonic: PitchClass,
    pub kind: ScaleKind,
    pub accidentals: i8,
    pub fifths: i8,
}

impl ScaleDefinition {
    /// Tonic spelling as displayed for this key (flat keys spell flat).
    pub fn tonic_name(&self) -> &'static str {
        self.tonic.spelled(self.accidentals < 0)
    }
}

use PitchClass::*;

pub const MAJOR_SCALES: [ScaleDefinition; 12] = [
    scale_def("C Major", C, ScaleKind::Major, 0),
    scale_def("G Major", G, ScaleKind::Major, 1),
    scale_def("D Major", D, ScaleKind::Major, 2),
    scale_def("A Major", A, ScaleKind::Major, 3),
    scale_def("E Major", E, ScaleKind::Major, 4),
    scale_def("B Major", B, ScaleKind::Major, 5),
    scale_def("F# Major", FSharp, ScaleKind::Major, 6),
    scale_def("Db Major", CSharp, ScaleKind::Major, -5),
    scale_def("Ab Major", GSharp, ScaleKind::Major, -4),
    scale_def("Eb Major", DSharp, ScaleKind::Major, -3),
    scale_def("Bb Major", ASharp, ScaleKind::Major, -2),
    scale_def("F Major", F, ScaleKind::Major, -1),
];

pub const MINOR_SCALES: [ScaleDefinition; 12] = [
    scale_def("A Minor", A, ScaleKind::Minor, 0),
    scale_def("E Minor", E, ScaleKind::Minor, 1),
    scale_def("B Minor", B, ScaleKind::Minor, 2),
    scale_def("F# Minor", FSharp, ScaleKind::Minor, 3),
    scale_def("C# Minor", CSharp, ScaleKind::Minor, 4),
    scale_def("G# Minor", GSharp, ScaleKind::Minor, 5),
    scale_def("D# Minor", DSharp, ScaleKind::Minor, 6),
    scale_def("D Minor", D, ScaleKind::Minor, -1),
    scale_def("G Minor", G, ScaleKind::Minor, -2),
    scale_def("C Minor", C, ScaleKind::Minor, -3),
    scale_def("F Minor", F, ScaleKind::Minor, -4),
    scale_def("Bb Minor", ASharp, ScaleKind::Minor, -5),
];

const fn scale_def(
    name: &'static str,
    tonic: PitchClass,
    kind: ScaleKind,
    accidentals: i8,
) -> ScaleDefinition {
    // For major and natural minor keys the circle-of-fifths position equals
    // the signed accidental count.
    ScaleDefinition {
        name,
        tonic,
        kind,
        accidentals,
        fifths: accidentals,
    }
}

/// Semitone step patterns. Seven steps summing to 12: the last step closes
/// the octave back to the tonic and emits no extra note.
pub const MAJOR_STEPS: [u8; 7] = [2, 2, 1, 2, 2, 2, 1];
pub const MINOR_STEPS: [u8; 7] = [2, 1, 2, 2, 1, 2, 2];

/// A scale with its concrete note spellings, derived from a definition.
#[derive(Debug, Clone, Serialize)]
pub struct Scale {
    pub name: String,
    pub kind: ScaleKind,
    pub tonic: String,
    /// The 7 scale notes, tonic first, spelled for this key.
    pub notes: Vec<String>,
    /// Notes spelled with a sharp marker.
    pub sharps: Vec<String>,
    /// Notes spelled with a flat marker.
    pub flats: Vec<String>,
}

/// Walks the step pattern from the tonic: 7 notes, tonic first.
pub fn build_scale(tonic: PitchClass, steps: &[u8; 7]) -> [PitchClass; 7] {
    let mut notes = [tonic; 7];
    let mut index = tonic.index() as i32;
    for (position, step) in steps[..6].iter().enumerate() {
        index += *step as i32;
        notes[position + 1] = PitchClass::from_index(index);
    }
    notes
}

/// Derives the full scale for a catalog entry, spelling notes per its key
/// signature.
pub fn scale_for(definition: &ScaleDefinition) -> Scale {
    let steps = match definition.kind {
        ScaleKind::Major => &MAJOR_STEPS,
        ScaleKind::Minor => &MINOR_STEPS,
    };
    let use_flats = definition.accidentals < 0;
    let notes: Vec<String> = build_scale(definition.tonic, steps)
        .iter()
        .map(|pitch| pitch.spelled(use_flats).to_owned())
        .collect();

    let sharps = notes.iter().filter(|n| n.ends_with('#')).cloned().collect();
    let flats = notes.iter().filter(|n| n.ends_with('b')).cloned().collect();

    Scale {
        name: definition.name.to_owned(),
        kind: definition.kind,
        tonic: definition.tonic_name().to_owned(),
        notes,
        sharps,
        flats,
    }
}

/// Looks up a catalog entry by kind and tonic spelling (as displayed, e.g.
/// "Bb" for the flat keys). Case-insensitive on the tonic letter.
pub fn find_scale(kind: ScaleKind, tonic: &str) -> Option<&'static ScaleDefinition> {
    let catalog: &[ScaleDefinition] = match kind {
        ScaleKind::Major => &MAJOR_SCALES,
        ScaleKind::Minor => &MINOR_SCALES,
    };
    catalog
        .iter()
        .find(|def| def.tonic_name().eq_ignore_ascii_case(tonic))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl ScaleDefinition {
    pub fn difficulty(&self) -> Difficulty {
        match self.accidentals.unsigned_abs() {
            0 | 1 => Difficulty::Easy,
            2 | 3 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

/// Scale names partitioned by key-signature difficulty, used by adaptive
/// exercise generation to widen the candidate pool as a streak grows.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleDifficultyTiers {
    pub easy: Vec<&'static str>,
    pub medium: Vec<&'static str>,
    pub hard: Vec<&'static str>,
}

pub fn scales_by_difficulty() -> ScaleDifficultyTiers {
    let mut tiers = ScaleDifficultyTiers {
        easy: Vec::new(),
        medium: Vec::new(),
        hard: Vec::new(),
    };
    for def in MAJOR_SCALES.iter().chain(MINOR_SCALES.iter()) {
        let tier = match def.difficulty() {
            Difficulty::Easy => &mut tiers.easy,
            Difficulty::Medium => &mut tiers.medium,
            Difficulty::Hard => &mut tiers.hard,
        };
        tier.push(def.name);
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn c_major_is_the_canonical_example() {
        let scale = scale_for(find_scale(ScaleKind::Major, "C").unwrap());
        assert_eq!(scale.notes, ["C", "D", "E", "F", "G", "A", "B"]);
        assert!(scale.sharps.is_empty());
        assert!(scale.flats.is_empty());
    }

    #[test]
    fn a_minor_is_the_canonical_example() {
        let scale = scale_for(find_scale(ScaleKind::Minor, "A").unwrap());
        assert_eq!(scale.notes, ["A", "B", "C", "D", "E", "F", "G"]);
    }

    #[test]
    fn flat_keys_are_spelled_with_flats() {
        let scale = scale_for(find_scale(ScaleKind::Major, "Bb").unwrap());
        assert_eq!(scale.notes, ["Bb", "C", "D", "Eb", "F", "G", "A"]);
        assert_eq!(scale.flats, ["Bb", "Eb"]);
        assert!(scale.sharps.is_empty());
    }

    #[test]
    fn sharp_keys_are_spelled_with_sharps() {
        let scale = scale_for(find_scale(ScaleKind::Major, "D").unwrap());
        assert_eq!(scale.notes, ["D", "E", "F#", "G", "A", "B", "C#"]);
        assert_eq!(scale.sharps, ["F#", "C#"]);
        assert!(scale.flats.is_empty());
    }

    #[test]
    fn every_scale_has_7_distinct_pitch_classes() {
        for def in MAJOR_SCALES.iter().chain(MINOR_SCALES.iter()) {
            let scale = scale_for(def);
            assert_eq!(scale.notes.len(), 7, "{}", def.name);
            let classes: HashSet<PitchClass> = scale
                .notes
                .iter()
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(classes.len(), 7, "{}", def.name);
            assert_eq!(scale.notes[0], def.tonic_name(), "{}", def.name);
        }
    }

    #[test]
    fn step_patterns_span_exactly_one_octave() {
        assert_eq!(MAJOR_STEPS.iter().map(|s| *s as u32).sum::<u32>(), 12);
        assert_eq!(MINOR_STEPS.iter().map(|s| *s as u32).sum::<u32>(), 12);
    }

    #[test]
    fn difficulty_tiers_partition_the_whole_catalog() {
        let tiers = scales_by_difficulty();
        assert_eq!(tiers.easy.len() + tiers.medium.len() + tiers.hard.len(), 24);
        // |accidentals| <= 1 for both kinds: C, G, F major + A, E, D minor
        assert_eq!(tiers.easy.len(), 6);
        assert!(tiers.easy.contains(&"C Major"));
        assert!(tiers.hard.contains(&"F# Major"));
        assert!(tiers.medium.contains(&"Eb Major"));
    }

    #[test]
    fn catalog_lookup_misses_unknown_tonics() {
        assert!(find_scale(ScaleKind::Major, "H").is_none());
        // C# major is not in the catalog, its enharmonic Db is
        assert!(find_scale(ScaleKind::Major, "C#").is_none());
        assert!(find_scale(ScaleKind::Major, "Db").is_some());
    }
}
