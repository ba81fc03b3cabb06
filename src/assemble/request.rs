//! Build requests for the assembler.

use std::sync::Arc;

use crate::instrument::SamplerOptions;
use crate::render::InstrumentFactory;
use crate::runtime::{BufferSourceOptions, NodeFactory};
use crate::theory::Note;

/// Receives the completed fraction of a build, `0.0..=1.0`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Selects which keys of a keyed sample set get rendered.
pub type KeyFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Render every note of `notes` from the nearest recording of `source_instrument`.
#[derive(Clone, Default)]
pub struct SampledBuffersRequest {
    pub notes: Vec<Note>,
    pub source_instrument: String,
    pub rendered_instrument: String,
    /// Seconds of tail rendered after the stretched recording ends.
    pub additional_render_length: f64,
    pub pitch_shift: i32,
    /// Play the recordings backwards.
    pub reverse: bool,
    /// Gain and fades of the replayed recordings. The rate is set per note.
    pub source_options: BufferSourceOptions,
    pub destination: Option<NodeFactory>,
    pub on_progress: Option<ProgressFn>,
}

impl SampledBuffersRequest {
    pub fn new(
        source_instrument: impl Into<String>,
        rendered_instrument: impl Into<String>,
        notes: Vec<Note>,
    ) -> Self {
        Self {
            notes,
            source_instrument: source_instrument.into(),
            rendered_instrument: rendered_instrument.into(),
            ..Self::default()
        }
    }

    pub fn on_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(progress));
        self
    }
}

/// Re-render every recording of `source_instrument` one to one.
#[derive(Clone, Default)]
pub struct BuffersRequest {
    pub source_instrument: String,
    pub rendered_instrument: String,
    pub additional_render_length: f64,
    pub source_options: BufferSourceOptions,
    pub destination: Option<NodeFactory>,
    /// Keyed sets only: render just the keys it accepts.
    pub key_filter: Option<KeyFilter>,
    pub on_progress: Option<ProgressFn>,
}

impl BuffersRequest {
    pub fn new(source_instrument: impl Into<String>, rendered_instrument: impl Into<String>) -> Self {
        Self {
            source_instrument: source_instrument.into(),
            rendered_instrument: rendered_instrument.into(),
            ..Self::default()
        }
    }

    pub fn key_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.key_filter = Some(Arc::new(filter));
        self
    }

    pub fn on_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(progress));
        self
    }

    pub(crate) fn accepts(&self, key: &str) -> bool {
        self.key_filter.as_ref().map_or(true, |filter| filter(key))
    }
}

/// Play each note on a fresh instrument and keep the result.
#[derive(Clone)]
pub struct InstrumentRequest {
    pub rendered_instrument: String,
    pub notes: Vec<Note>,
    /// Seconds each note is held and rendered for.
    pub note_duration: f64,
    pub create_instrument: InstrumentFactory,
    /// Options of the sampler built from the rendered notes.
    pub sampler: SamplerOptions,
    pub on_progress: Option<ProgressFn>,
}

impl InstrumentRequest {
    pub fn new(
        rendered_instrument: impl Into<String>,
        notes: Vec<Note>,
        note_duration: f64,
        create_instrument: InstrumentFactory,
    ) -> Self {
        Self {
            rendered_instrument: rendered_instrument.into(),
            notes,
            note_duration,
            create_instrument,
            sampler: SamplerOptions::default(),
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(progress));
        self
    }
}

/// Report `done` of `total` to an optional callback.
pub(crate) fn report(progress: Option<&ProgressFn>, done: usize, total: usize) {
    if let Some(progress) = progress {
        progress(done as f64 / total.max(1) as f64);
    }
}
