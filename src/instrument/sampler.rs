//! Sampler — plays the nearest recording for each note, stretched to pitch.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Instrument, InstrumentError};
use crate::runtime::{AudioBlock, AudioNode, BufferSource, BufferSourceOptions, FadeCurve, Volume};
use crate::sample::{
    create_buffers, get_closest_note, interval_to_frequency_ratio, key_to_midi, AudioBuffer,
    BufferLoader, BufferSet, NoNearbySampleError, SampleSet, SampleSource, SearchOptions,
};
use crate::theory::Note;

/// Playback settings shared by every voice of a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerOptions {
    /// Fade-in, seconds.
    pub attack: f64,
    /// Fade-out after a release, seconds.
    pub release: f64,
    pub curve: FadeCurve,
    /// Output level in dB.
    pub volume: f32,
    pub search: SearchOptions,
    /// Semitones added to every note.
    pub pitch_shift: i32,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            attack: 0.0,
            release: 0.1,
            curve: FadeCurve::Linear,
            volume: 0.0,
            search: SearchOptions::default(),
            pitch_shift: 0,
        }
    }
}

struct Voice {
    midi: i32,
    released: bool,
    source: BufferSource,
}

/// A playable instrument over a note-keyed buffer set.
///
/// Keys are note names (`C4`) or MIDI numbers (`60`). Voices are tracked until
/// they end so [`release_all`](Instrument::release_all) can reach them.
pub struct Sampler {
    name: String,
    buffers: BTreeMap<i32, Arc<AudioBuffer>>,
    sampled: BTreeSet<i32>,
    options: SamplerOptions,
    voices: Vec<Voice>,
    output: Volume,
    chain: Vec<Box<dyn AudioNode>>,
    scratch: AudioBlock,
    now: f64,
    disposed: bool,
}

impl Sampler {
    pub fn new(buffers: BufferSet, options: SamplerOptions) -> Result<Self, InstrumentError> {
        let mut by_midi = BTreeMap::new();
        for (key, buffer) in buffers.into_entries() {
            by_midi.insert(key_to_midi(&key)?, Arc::new(buffer));
        }
        let sampled = by_midi.keys().copied().collect();
        Ok(Self {
            name: "sampler".to_string(),
            buffers: by_midi,
            sampled,
            options,
            voices: Vec::new(),
            output: Volume::new(options.volume),
            chain: Vec::new(),
            scratch: AudioBlock::new(1, 0, 44100),
            now: 0.0,
            disposed: false,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// MIDI numbers that have a recording.
    pub fn sampled_midi(&self) -> impl Iterator<Item = i32> + '_ {
        self.sampled.iter().copied()
    }

    /// Voices that have not ended yet.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn set_volume(&mut self, db: f32) -> Result<(), InstrumentError> {
        self.check("set_volume")?;
        self.options.volume = db;
        self.output.set_db(db);
        Ok(())
    }

    /// Append an effect after the output volume.
    pub fn connect(&mut self, node: Box<dyn AudioNode>) -> Result<(), InstrumentError> {
        self.check("connect")?;
        self.chain.push(node);
        Ok(())
    }

    /// Stop every voice at once and release the recordings.
    ///
    /// Fails with [`InstrumentError::Disposed`] when called a second time.
    pub fn dispose(&mut self) -> Result<(), InstrumentError> {
        self.check("dispose")?;
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        self.disposed = true;
        for voice in self.voices.iter_mut() {
            voice.source.dispose();
        }
        self.voices.clear();
        for node in self.chain.iter_mut() {
            node.dispose();
        }
        self.chain.clear();
        self.buffers.clear();
    }

    fn check(&self, operation: &'static str) -> Result<(), InstrumentError> {
        if self.disposed {
            Err(InstrumentError::Disposed { operation })
        } else {
            Ok(())
        }
    }

    /// Recording to play for `target` and the rate that moves it there.
    fn resolve(&self, target: i32) -> Result<(Arc<AudioBuffer>, f64), InstrumentError> {
        let closest = get_closest_note(target, &self.sampled, self.options.search)?;
        let rate = interval_to_frequency_ratio(
            f64::from(target) - f64::from(closest) + f64::from(self.options.pitch_shift),
        );
        match self.buffers.get(&closest) {
            Some(buffer) => Ok((buffer.clone(), rate)),
            None => Err(InstrumentError::NoNearbySample(NoNearbySampleError {
                target_midi: target,
                max_interval: self.options.search.max_interval,
            })),
        }
    }
}

impl AudioNode for Sampler {
    fn process(&mut self, block: &mut AudioBlock) {
        if self.disposed {
            return;
        }
        self.scratch.conform_to(block);
        for voice in self.voices.iter_mut() {
            voice.source.process(&mut self.scratch);
        }
        self.output.process(&mut self.scratch);
        for node in self.chain.iter_mut() {
            node.process(&mut self.scratch);
        }
        block.mix_from(&self.scratch);

        self.now = block.end_time();
        self.voices.retain(|voice| !voice.source.is_ended());
    }

    /// Render-job cleanup; a sampler already disposed is left as is.
    fn dispose(&mut self) {
        if !self.disposed {
            self.teardown();
        }
    }
}

impl Instrument for Sampler {
    fn trigger_attack(&mut self, note: &Note, time: Option<f64>, velocity: f32) -> Result<(), InstrumentError> {
        self.check("trigger_attack")?;
        let target = note.to_midi()?;
        let (buffer, playback_rate) = self.resolve(target)?;
        let mut source = BufferSource::new(
            buffer,
            BufferSourceOptions {
                playback_rate,
                gain: velocity.clamp(0.0, 1.0),
                fade_in: self.options.attack,
                fade_out: self.options.release,
                curve: self.options.curve,
            },
        );
        source.start(time.unwrap_or(self.now));
        self.voices.push(Voice {
            midi: target,
            released: false,
            source,
        });
        Ok(())
    }

    fn trigger_release(&mut self, note: &Note, time: Option<f64>) -> Result<(), InstrumentError> {
        self.check("trigger_release")?;
        let target = note.to_midi()?;
        let at = time.unwrap_or(self.now);
        for voice in self.voices.iter_mut().filter(|v| v.midi == target && !v.released) {
            voice.source.stop(at);
            voice.released = true;
        }
        Ok(())
    }

    fn release_all(&mut self, time: Option<f64>) -> Result<(), InstrumentError> {
        self.check("release_all")?;
        let at = time.unwrap_or(self.now);
        for voice in self.voices.iter_mut() {
            voice.source.stop(at);
            voice.released = true;
        }
        Ok(())
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Decode `sources` and build a sampler over them.
///
/// Already decoded entries are copied without touching `loader`.
pub fn create_sampler(
    sources: &SampleSet<SampleSource>,
    loader: &dyn BufferLoader,
    options: SamplerOptions,
) -> Result<Sampler, InstrumentError> {
    let buffers = create_buffers(sources, loader)?;
    Sampler::new(buffers, options)
}

/// A sampler that shifts every note by `pitch_shift` semitones at trigger time.
pub fn create_pitch_shifted_sampler(
    sources: &SampleSet<SampleSource>,
    loader: &dyn BufferLoader,
    pitch_shift: i32,
    options: SamplerOptions,
) -> Result<Sampler, InstrumentError> {
    let options = SamplerOptions {
        pitch_shift,
        ..options
    };
    Ok(create_sampler(sources, loader, options)?.with_name("pitch-shifted-sampler"))
}

/// A sampler playing mono mixdowns of `sources` backwards.
pub fn create_reverse_sampler(
    sources: &SampleSet<SampleSource>,
    loader: &dyn BufferLoader,
    options: SamplerOptions,
) -> Result<Sampler, InstrumentError> {
    let reversed = create_buffers(sources, loader)?.map(|buffer| {
        let mut mono = AudioBuffer::from_array(&buffer.to_array(), buffer.sample_rate());
        mono.reverse();
        mono
    });
    Ok(Sampler::new(reversed, options)?.with_name("reverse-sampler"))
}
