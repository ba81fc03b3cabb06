//! Closest-sample lookup — which recording to stretch for a note, and by how much.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::theory::{Note, ParseError};

/// Search parameters for [`get_closest_note`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Largest semitone offset checked in each direction.
    pub max_interval: u32,
    /// Check `target + offset` before `target - offset` at each step.
    pub prefer_upward: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_interval: 96,
            prefer_upward: true,
        }
    }
}

/// No recorded sample lies within the search radius of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoNearbySampleError {
    pub target_midi: i32,
    pub max_interval: u32,
}

impl fmt::Display for NoNearbySampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no nearby samples found for midi {} within {} semitones",
            self.target_midi, self.max_interval
        )
    }
}

impl std::error::Error for NoNearbySampleError {}

/// Failure to pick a sample for a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleLookupError {
    /// The target or a sample key is not a usable note.
    Note(ParseError),
    NoNearbySample(NoNearbySampleError),
}

impl fmt::Display for SampleLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleLookupError::Note(e) => write!(f, "{e}"),
            SampleLookupError::NoNearbySample(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SampleLookupError {}

impl From<ParseError> for SampleLookupError {
    fn from(e: ParseError) -> Self {
        SampleLookupError::Note(e)
    }
}

impl From<NoNearbySampleError> for SampleLookupError {
    fn from(e: NoNearbySampleError) -> Self {
        SampleLookupError::NoNearbySample(e)
    }
}

/// The recording chosen for a note.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledNote {
    /// Key of the chosen recording, as given by the caller.
    pub key: String,
    pub midi: i32,
    /// Speed factor that moves the recording to the target pitch.
    pub playback_rate: f64,
}

/// Equal-tempered frequency ratio of an interval (`12` → `2.0`).
pub fn interval_to_frequency_ratio(semitones: f64) -> f64 {
    2f64.powf(semitones / 12.0)
}

/// MIDI number for a sample key: either a plain integer or a note name.
pub fn key_to_midi(key: &str) -> Result<i32, ParseError> {
    match key.parse::<i32>() {
        Ok(midi) => Ok(midi),
        Err(_) => Note::parse(key)?.to_midi(),
    }
}

/// Find the sampled MIDI number nearest to `target_midi`.
///
/// Offsets grow from 0 to `max_interval`; at each offset both directions are
/// checked, upward first unless `prefer_upward` is off.
pub fn get_closest_note(
    target_midi: i32,
    sampled: &BTreeSet<i32>,
    options: SearchOptions,
) -> Result<i32, NoNearbySampleError> {
    for offset in 0..=options.max_interval as i32 {
        let (up, down) = (target_midi.checked_add(offset), target_midi.checked_sub(offset));
        let (first, second) = if options.prefer_upward { (up, down) } else { (down, up) };
        if let Some(found) = [first, second].into_iter().flatten().find(|m| sampled.contains(m)) {
            return Ok(found);
        }
    }
    Err(NoNearbySampleError {
        target_midi,
        max_interval: options.max_interval,
    })
}

/// Pick the recording for `note` among `sampled_keys` and the rate to play it at.
///
/// `pitch_shift` adds a fixed number of semitones on top of the correction.
pub fn sample_note(
    note: &Note,
    sampled_keys: &[String],
    pitch_shift: i32,
    options: SearchOptions,
) -> Result<SampledNote, SampleLookupError> {
    let target = note.to_midi()?;
    let keyed = sampled_keys
        .iter()
        .map(|key| key_to_midi(key).map(|midi| (midi, key)))
        .collect::<Result<Vec<_>, _>>()?;
    let midis: BTreeSet<i32> = keyed.iter().map(|(midi, _)| *midi).collect();

    let closest = get_closest_note(target, &midis, options)?;
    let key = keyed
        .iter()
        .find(|(midi, _)| *midi == closest)
        .map(|(_, key)| (*key).clone())
        .unwrap_or_default();

    Ok(SampledNote {
        key,
        midi: closest,
        playback_rate: interval_to_frequency_ratio(
            f64::from(target) - f64::from(closest) + f64::from(pitch_shift),
        ),
    })
}
