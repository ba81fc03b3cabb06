//! Chords, inversions and octave spreading.

use super::interval::{m3, m7, M2, M3, M7, P5, P8};
use super::note::Note;

/// Stack `intervals` on `tonic`. The tonic comes first.
pub fn chord(tonic: &Note, intervals: &[i32]) -> Vec<Note> {
    std::iter::once(*tonic)
        .chain(intervals.iter().map(|&interval| tonic.transpose(interval)))
        .collect()
}

/// Chord builder for a fixed interval stack.
pub fn make_chord(intervals: Vec<i32>) -> impl Fn(&Note) -> Vec<Note> {
    move |tonic| chord(tonic, &intervals)
}

/// Rotate a voicing by `inversion` steps.
///
/// Positive inversions move notes from the bottom to the top an octave up,
/// negative inversions move notes from the top to the bottom an octave down.
pub fn invert(notes: &[Note], inversion: i32) -> Vec<Note> {
    let mut inverted = notes.to_vec();
    if inverted.is_empty() {
        return inverted;
    }
    for _ in 0..inversion.unsigned_abs() {
        if inversion > 0 {
            let lowest = inverted.remove(0);
            inverted.push(lowest.transpose(P8));
        } else if let Some(highest) = inverted.pop() {
            inverted.insert(0, highest.transpose(-P8));
        }
    }
    inverted
}

/// Every pitch class at every octave, octave-major (`C3 E3 G3 C4 E4 G4`).
///
/// Only the pitch class of each input note is used.
pub fn toss(pitch_classes: &[Note], octaves: &[i32]) -> Vec<Note> {
    octaves
        .iter()
        .flat_map(|&octave| {
            pitch_classes
                .iter()
                .map(move |note| Note::at(note.pitch_class(), octave))
        })
        .collect()
}

/// Chord qualities with fixed interval stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Major7th,
    Minor7th,
    Dominant7th,
    Major9th,
    Minor9th,
}

impl ChordQuality {
    pub fn intervals(self) -> &'static [i32] {
        const MAJOR: [i32; 2] = [M3, P5];
        const MINOR: [i32; 2] = [m3, P5];
        const MAJOR_7TH: [i32; 3] = [M3, P5, M7];
        const MINOR_7TH: [i32; 3] = [m3, P5, m7];
        const DOMINANT_7TH: [i32; 3] = [M3, P5, m7];
        const MAJOR_9TH: [i32; 4] = [M3, P5, M7, P8 + M2];
        const MINOR_9TH: [i32; 4] = [m3, P5, m7, P8 + M2];
        match self {
            ChordQuality::Major => &MAJOR,
            ChordQuality::Minor => &MINOR,
            ChordQuality::Major7th => &MAJOR_7TH,
            ChordQuality::Minor7th => &MINOR_7TH,
            ChordQuality::Dominant7th => &DOMINANT_7TH,
            ChordQuality::Major9th => &MAJOR_9TH,
            ChordQuality::Minor9th => &MINOR_9TH,
        }
    }

    pub fn build(self, tonic: &Note) -> Vec<Note> {
        chord(tonic, self.intervals())
    }
}

pub fn major(tonic: &Note) -> Vec<Note> {
    ChordQuality::Major.build(tonic)
}

pub fn minor(tonic: &Note) -> Vec<Note> {
    ChordQuality::Minor.build(tonic)
}

pub fn major7th(tonic: &Note) -> Vec<Note> {
    ChordQuality::Major7th.build(tonic)
}

pub fn minor7th(tonic: &Note) -> Vec<Note> {
    ChordQuality::Minor7th.build(tonic)
}

pub fn dominant7th(tonic: &Note) -> Vec<Note> {
    ChordQuality::Dominant7th.build(tonic)
}

pub fn major9th(tonic: &Note) -> Vec<Note> {
    ChordQuality::Major9th.build(tonic)
}

pub fn minor9th(tonic: &Note) -> Vec<Note> {
    ChordQuality::Minor9th.build(tonic)
}
