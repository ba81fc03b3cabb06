//! Oscillator primitives — waveform generation for synthesizers.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Available waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    #[default]
    Saw,
    Square,
    Triangle,
}

/// Generate a single sample for the given waveform at the specified phase.
///
/// `phase` is in the range [0.0, 1.0), representing one full cycle.
/// Returns a value in [-1.0, 1.0].
pub fn oscillator(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Saw => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

/// Frequency in Hz of a MIDI note, A4 (69) = 440 Hz.
pub fn midi_to_freq(note: i32) -> f64 {
    440.0 * 2.0f64.powf((note as f64 - 69.0) / 12.0)
}

/// A running phase accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    value: f64,
    increment: f64,
}

impl Phase {
    pub fn new(freq: f64, sample_rate: u32) -> Self {
        Self {
            value: 0.0,
            increment: freq / sample_rate as f64,
        }
    }

    /// Current sample of `waveform`, then step one frame.
    pub fn next(&mut self, waveform: Waveform) -> f64 {
        let sample = oscillator(waveform, self.value);
        self.value = (self.value + self.increment).fract();
        sample
    }
}
