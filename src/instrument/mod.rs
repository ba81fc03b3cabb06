//! Instruments — playable sources driven by note triggers.
//!
//! A [`Sampler`] plays decoded recordings, stretching the nearest one to each
//! requested note. A [`Synth`] generates tones and is the usual subject of
//! instrument prerendering.

pub mod envelope;
pub mod oscillator;
pub mod sampler;
pub mod synth;

pub use envelope::AdsrEnvelope;
pub use oscillator::{midi_to_freq, oscillator, Waveform};
pub use sampler::{
    create_pitch_shifted_sampler, create_reverse_sampler, create_sampler, Sampler, SamplerOptions,
};
pub use synth::{Synth, SynthOptions};

use std::fmt;

use crate::runtime::AudioNode;
use crate::sample::{LoadError, NoNearbySampleError, SampleLookupError};
use crate::theory::{Note, ParseError};

/// Common interface for all instruments.
///
/// Times are context seconds; `None` means "now", the end of the last
/// processed block.
pub trait Instrument: AudioNode {
    /// Start sounding `note` at `time` with `velocity` in `0.0..=1.0`.
    fn trigger_attack(&mut self, note: &Note, time: Option<f64>, velocity: f32) -> Result<(), InstrumentError>;

    /// Begin the release of every voice sounding `note`.
    fn trigger_release(&mut self, note: &Note, time: Option<f64>) -> Result<(), InstrumentError>;

    /// Release every sounding voice.
    fn release_all(&mut self, time: Option<f64>) -> Result<(), InstrumentError>;

    /// Current context time as seen by this instrument.
    fn now(&self) -> f64;

    /// Human-readable name for this instrument.
    fn name(&self) -> &str;

    /// Attack at `time`, release `duration` seconds later.
    fn trigger_attack_release(
        &mut self,
        note: &Note,
        duration: f64,
        time: Option<f64>,
    ) -> Result<(), InstrumentError> {
        let start = time.unwrap_or_else(|| self.now());
        self.trigger_attack(note, Some(start), 1.0)?;
        self.trigger_release(note, Some(start + duration))
    }
}

/// Errors raised by instrument operations.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// The instrument was used after `dispose`.
    Disposed { operation: &'static str },
    /// A note or sample key is not a usable absolute note.
    Note(ParseError),
    NoNearbySample(NoNearbySampleError),
    Load(LoadError),
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentError::Disposed { operation } => {
                write!(f, "{operation} was called after the instrument was already disposed")
            }
            InstrumentError::Note(e) => write!(f, "{e}"),
            InstrumentError::NoNearbySample(e) => write!(f, "{e}"),
            InstrumentError::Load(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InstrumentError {}

impl From<ParseError> for InstrumentError {
    fn from(e: ParseError) -> Self {
        InstrumentError::Note(e)
    }
}

impl From<NoNearbySampleError> for InstrumentError {
    fn from(e: NoNearbySampleError) -> Self {
        InstrumentError::NoNearbySample(e)
    }
}

impl From<SampleLookupError> for InstrumentError {
    fn from(e: SampleLookupError) -> Self {
        match e {
            SampleLookupError::Note(e) => InstrumentError::Note(e),
            SampleLookupError::NoNearbySample(e) => InstrumentError::NoNearbySample(e),
        }
    }
}

impl From<LoadError> for InstrumentError {
    fn from(e: LoadError) -> Self {
        InstrumentError::Load(e)
    }
}
