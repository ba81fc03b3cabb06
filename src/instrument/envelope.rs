//! ADSR envelope generator for synthesizers.

use serde::{Deserialize, Serialize};

/// Attack-Decay-Sustain-Release envelope.
///
/// All time values are in seconds. Sustain is a level (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsrEnvelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl AdsrEnvelope {
    /// Level `t` seconds after the attack while the note is still held.
    ///
    /// - During `[0, attack)`: linear ramp from 0 to 1.
    /// - During `[attack, attack+decay)`: linear ramp from 1 to sustain level.
    /// - Afterwards: sustain level.
    pub fn held_level(&self, t: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }

        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            let decay_t = (t - self.attack) / self.decay;
            1.0 - decay_t * (1.0 - self.sustain)
        } else if self.attack <= 0.0 && self.decay <= 0.0 && t == 0.0 {
            1.0
        } else {
            self.sustain
        }
    }

    /// Level `t` seconds into the release, starting from `from_level`.
    pub fn release_level(&self, from_level: f64, t: f64) -> f64 {
        if t < 0.0 {
            from_level
        } else if self.release <= 0.0 || t >= self.release {
            0.0
        } else {
            from_level * (1.0 - t / self.release)
        }
    }

    /// Level at time `t` for a note released after `note_duration`.
    pub fn amplitude(&self, t: f64, note_duration: f64) -> f64 {
        if t < note_duration {
            self.held_level(t)
        } else {
            self.release_level(self.held_level(note_duration), t - note_duration)
        }
    }

    /// Total sound duration including release tail.
    pub fn total_duration(&self, note_duration: f64) -> f64 {
        note_duration + self.release
    }
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.2,
            sustain: 0.6,
            release: 0.4,
        }
    }
}
