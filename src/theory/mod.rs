//! Note theory — pitch classes, note parsing and transposition, intervals, chords.
//!
//! Everything here is pure and allocation-light. Notes either carry an octave
//! (`C4`) or are bare pitch classes (`C`); the latter transpose fine but have no
//! absolute pitch, so distance and MIDI conversion reject them.

pub mod chord;
pub mod error;
pub mod interval;
pub mod note;
pub mod pitch;

pub use chord::{
    chord, dominant7th, invert, major, major7th, major9th, make_chord, minor, minor7th, minor9th,
    toss, ChordQuality,
};
pub use error::{ParseError, ParseErrorKind};
pub use note::{
    distance, distance_from, get_octave, get_pitch_class, simplify_note, sort_notes, transpose,
    transpose_by, transposer, Note,
};
pub use pitch::PitchClass;
