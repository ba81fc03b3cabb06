//! Notes — tolerant parsing, normalization, transposition and distance.

use std::fmt;
use std::str::FromStr;

use super::error::ParseError;
use super::pitch::PitchClass;

/// Largest written octave magnitude; keeps MIDI arithmetic in `i32`.
pub const MAX_OCTAVE: i32 = 1_000_000;

/// A pitch class with an optional octave.
///
/// `C4` is middle C (MIDI 60). A note without an octave is a bare pitch class:
/// it can be transposed but has no absolute pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pitch_class: PitchClass,
    octave: Option<i32>,
}

/// Letter, accidentals and written octave of a note string, before folding.
struct NoteParts {
    letter: PitchClass,
    accidentals: i32,
    octave: Option<i32>,
}

/// Split `<letter>[#b]*<octave?>` into its parts.
///
/// The letter is case-insensitive, each `#` adds a semitone and each `b`
/// removes one. The octave may be negative so that every displayed note
/// parses back.
fn split_note(input: &str) -> Result<NoteParts, ParseError> {
    let mut chars = input.chars().peekable();
    let letter = chars
        .next()
        .and_then(PitchClass::from_letter)
        .ok_or_else(|| ParseError::malformed(input))?;

    let mut accidentals = 0;
    while let Some(&c) = chars.peek() {
        match c {
            '#' => accidentals += 1,
            'b' => accidentals -= 1,
            _ => break,
        }
        chars.next();
    }

    let rest: String = chars.collect();
    let octave = if rest.is_empty() {
        None
    } else {
        let digits = rest.strip_prefix('-').unwrap_or(&rest);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::malformed(input));
        }
        let octave = rest.parse::<i32>().map_err(|_| ParseError::malformed(input))?;
        if !octave_in_range(octave) {
            return Err(ParseError::malformed(input));
        }
        Some(octave)
    };

    Ok(NoteParts {
        letter,
        accidentals,
        octave,
    })
}

fn octave_in_range(octave: i32) -> bool {
    (-MAX_OCTAVE..=MAX_OCTAVE).contains(&octave)
}

/// `+1` when an upward move wrapped past B→C, `-1` when a downward move
/// wrapped past C→B.
fn implicit_octave_change(from: PitchClass, to: PitchClass, upward: bool) -> i32 {
    if upward && from.index() > to.index() {
        1
    } else if !upward && from.index() < to.index() {
        -1
    } else {
        0
    }
}

/// Transpose a pitch class within a concrete octave.
///
/// Whole octaves are counted with truncating division, the remaining
/// semitones add one more octave when they cross the B/C boundary.
fn transpose_in_octave(pitch_class: PitchClass, octave: i32, semitones: i32) -> (PitchClass, i32) {
    let next = pitch_class.transpose(semitones);
    let next_octave = octave
        .saturating_add(semitones / 12)
        .saturating_add(implicit_octave_change(pitch_class, next, semitones > 0));
    (next, next_octave)
}

impl Note {
    /// A note at a concrete octave.
    pub fn at(pitch_class: PitchClass, octave: i32) -> Self {
        Self {
            pitch_class,
            octave: Some(octave),
        }
    }

    /// A bare pitch class without octave.
    pub fn bare(pitch_class: PitchClass) -> Self {
        Self {
            pitch_class,
            octave: None,
        }
    }

    /// Parse and normalize tolerant note text (`c`, `Eb4`, `F##3`, `Cb4` → `B3`).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let parts = split_note(input)?;
        Ok(match parts.octave {
            Some(octave) => {
                let (pitch_class, octave) =
                    transpose_in_octave(parts.letter, octave, parts.accidentals);
                Note::at(pitch_class, octave)
            }
            None => Note::bare(parts.letter.transpose(parts.accidentals)),
        })
    }

    /// Note for a MIDI number (60 → `C4`).
    pub fn from_midi(midi: i32) -> Self {
        Note::at(PitchClass::from_index(midi), midi.div_euclid(12) - 1)
    }

    pub fn pitch_class(&self) -> PitchClass {
        self.pitch_class
    }

    pub fn octave(&self) -> Option<i32> {
        self.octave
    }

    /// Move by `semitones`. Bare pitch classes stay bare.
    pub fn transpose(&self, semitones: i32) -> Note {
        match self.octave {
            Some(octave) => {
                let (pitch_class, octave) =
                    transpose_in_octave(self.pitch_class, octave, semitones);
                Note::at(pitch_class, octave)
            }
            None => Note::bare(self.pitch_class.transpose(semitones)),
        }
    }

    /// MIDI number (`C4` = 60). Fails for bare pitch classes and for octaves
    /// beyond [`MAX_OCTAVE`].
    pub fn to_midi(&self) -> Result<i32, ParseError> {
        let octave = self
            .octave
            .ok_or_else(|| ParseError::missing_octave(self.to_string()))?;
        if !octave_in_range(octave) {
            return Err(ParseError::malformed(self.to_string()));
        }
        Ok((octave + 1) * 12 + self.pitch_class.index())
    }
}

impl FromStr for Note {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.octave {
            Some(octave) => write!(f, "{}{}", self.pitch_class, octave),
            None => write!(f, "{}", self.pitch_class),
        }
    }
}

/// Written octave of a note string, if it has one (`Cb4` → 4).
pub fn get_octave(note: &str) -> Option<i32> {
    split_note(note).ok().and_then(|parts| parts.octave)
}

/// Pitch class of a note string with accidentals folded in (`Cb4` → B).
pub fn get_pitch_class(note: &str) -> Option<PitchClass> {
    split_note(note)
        .ok()
        .map(|parts| parts.letter.transpose(parts.accidentals))
}

pub fn transpose(note: &Note, semitones: i32) -> Note {
    note.transpose(semitones)
}

/// Fix the note and vary the interval.
pub fn transposer(note: Note) -> impl Fn(i32) -> Note {
    move |semitones| note.transpose(semitones)
}

/// Fix the interval and vary the note.
pub fn transpose_by(semitones: i32) -> impl Fn(&Note) -> Note {
    move |note| note.transpose(semitones)
}

/// Canonical form of a note (transposition by zero).
pub fn simplify_note(note: &Note) -> Note {
    note.transpose(0)
}

/// Signed semitone distance from `from` to `to`. Both need octaves.
pub fn distance(from: &Note, to: &Note) -> Result<i32, ParseError> {
    Ok(to.to_midi()? - from.to_midi()?)
}

/// Fix the starting note of [`distance`].
pub fn distance_from(from: Note) -> impl Fn(&Note) -> Result<i32, ParseError> {
    move |to| distance(&from, to)
}

/// Sort ascending by octave, then pitch class.
///
/// Bare pitch classes sort before octave-bearing notes, ordered by pitch class
/// among themselves.
pub fn sort_notes(notes: &[Note]) -> Vec<Note> {
    let mut sorted: Vec<Note> = notes.iter().map(simplify_note).collect();
    sorted.sort_by_key(|note| (note.octave(), note.pitch_class().index()));
    sorted
}
