//! Synth — two detuned oscillators per voice through an ADSR envelope.

use serde::{Deserialize, Serialize};

use super::envelope::AdsrEnvelope;
use super::oscillator::{midi_to_freq, Phase, Waveform};
use super::{Instrument, InstrumentError};
use crate::runtime::{AudioBlock, AudioNode, Volume};
use crate::theory::Note;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthOptions {
    pub waveform: Waveform,
    pub envelope: AdsrEnvelope,
    pub detune_cents: f64,
    /// Output level in dB.
    pub volume: f32,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            waveform: Waveform::Saw,
            envelope: AdsrEnvelope::default(),
            detune_cents: 12.0,
            volume: 0.0,
        }
    }
}

struct SynthVoice {
    midi: i32,
    velocity: f64,
    start: f64,
    release_at: Option<f64>,
    phases: Option<(Phase, Phase)>,
    done: bool,
}

/// Polyphonic synth; every trigger gets its own voice.
pub struct Synth {
    options: SynthOptions,
    voices: Vec<SynthVoice>,
    output: Volume,
    now: f64,
    disposed: bool,
}

impl Synth {
    pub fn new(options: SynthOptions) -> Self {
        Self {
            options,
            voices: Vec::new(),
            output: Volume::new(options.volume),
            now: 0.0,
            disposed: false,
        }
    }

    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn check(&self, operation: &'static str) -> Result<(), InstrumentError> {
        if self.disposed {
            Err(InstrumentError::Disposed { operation })
        } else {
            Ok(())
        }
    }
}

impl Default for Synth {
    fn default() -> Self {
        Self::new(SynthOptions::default())
    }
}

impl AudioNode for Synth {
    fn process(&mut self, block: &mut AudioBlock) {
        if self.disposed {
            return;
        }
        let sample_rate = block.sample_rate();
        let gain = self.output.gain() as f64;
        let detune_ratio = 2.0f64.powf(self.options.detune_cents / 1200.0);
        let SynthOptions {
            waveform, envelope, ..
        } = self.options;

        for voice in self.voices.iter_mut() {
            let (osc1, osc2) = voice.phases.get_or_insert_with(|| {
                let freq = midi_to_freq(voice.midi);
                (
                    Phase::new(freq, sample_rate),
                    Phase::new(freq * detune_ratio, sample_rate),
                )
            });

            for i in 0..block.frames() {
                let t = block.frame_time(i);
                if t < voice.start {
                    continue;
                }
                let level = match voice.release_at {
                    Some(release) if t >= release => {
                        if t >= release + envelope.release {
                            voice.done = true;
                            break;
                        }
                        let held = envelope.held_level(release - voice.start);
                        envelope.release_level(held, t - release)
                    }
                    _ => envelope.held_level(t - voice.start),
                };

                let mixed = (osc1.next(waveform) + osc2.next(waveform)) * 0.4;
                let sample = (mixed * level * voice.velocity * gain) as f32;
                for channel in block.channels_mut() {
                    channel[i] += sample;
                }
            }
        }

        self.now = block.end_time();
        self.voices.retain(|voice| !voice.done);
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.voices.clear();
    }
}

impl Instrument for Synth {
    fn trigger_attack(&mut self, note: &Note, time: Option<f64>, velocity: f32) -> Result<(), InstrumentError> {
        self.check("trigger_attack")?;
        let midi = note.to_midi()?;
        self.voices.push(SynthVoice {
            midi,
            velocity: velocity.clamp(0.0, 1.0) as f64,
            start: time.unwrap_or(self.now),
            release_at: None,
            phases: None,
            done: false,
        });
        Ok(())
    }

    fn trigger_release(&mut self, note: &Note, time: Option<f64>) -> Result<(), InstrumentError> {
        self.check("trigger_release")?;
        let midi = note.to_midi()?;
        let at = time.unwrap_or(self.now);
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.midi == midi && v.release_at.is_none())
        {
            voice.release_at = Some(at.max(voice.start));
        }
        Ok(())
    }

    fn release_all(&mut self, time: Option<f64>) -> Result<(), InstrumentError> {
        self.check("release_all")?;
        let at = time.unwrap_or(self.now);
        for voice in self.voices.iter_mut().filter(|v| v.release_at.is_none()) {
            voice.release_at = Some(at.max(voice.start));
        }
        Ok(())
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn name(&self) -> &str {
        "synth"
    }
}
