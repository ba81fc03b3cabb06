//! Prerendered-instrument assembler — turns a handful of recordings into a
//! complete note-indexed buffer set, once.
//!
//! Every build goes through the same steps:
//!
//! 1. The manifest or the sample library already has the rendered name: decode
//!    it and return, nothing is rendered.
//! 2. Another caller is building the same name: wait for its result.
//! 3. Otherwise resolve every note, decode each source recording once, queue
//!    one render per note, report progress as they finish, save the set to the
//!    library and return it.

pub mod request;

pub use request::{BuffersRequest, InstrumentRequest, KeyFilter, ProgressFn, SampledBuffersRequest};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::instrument::{create_sampler, InstrumentError, Sampler, SamplerOptions};
use crate::library::SampleLibrary;
use crate::render::{
    buffer_job, instrument_note_job, stretched_duration, BufferRenderSettings, BuildOutcome,
    PendingRender, RenderCoordinator, RenderError, RenderFormat,
};
use crate::runtime::BufferSourceOptions;
use crate::sample::{
    create_buffer, create_buffers, sample_note, AudioBuffer, BufferLoader, BufferSet, LoadError,
    Manifest, SampleLookupError, SampleSet, SampleSource, SearchOptions,
};
use request::report;

/// Errors that fail a whole build.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembleError {
    Load(LoadError),
    /// A requested note has no usable recording.
    Lookup(SampleLookupError),
    Render(RenderError),
    Instrument(InstrumentError),
    /// The source instrument is keyed but an array was required.
    NotAnArray(String),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::Load(e) => write!(f, "{e}"),
            AssembleError::Lookup(e) => write!(f, "{e}"),
            AssembleError::Render(e) => write!(f, "{e}"),
            AssembleError::Instrument(e) => write!(f, "{e}"),
            AssembleError::NotAnArray(name) => write!(f, "samples for '{name}' are not an array"),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<LoadError> for AssembleError {
    fn from(e: LoadError) -> Self {
        AssembleError::Load(e)
    }
}

impl From<SampleLookupError> for AssembleError {
    fn from(e: SampleLookupError) -> Self {
        AssembleError::Lookup(e)
    }
}

impl From<RenderError> for AssembleError {
    fn from(e: RenderError) -> Self {
        AssembleError::Render(e)
    }
}

impl From<InstrumentError> for AssembleError {
    fn from(e: InstrumentError) -> Self {
        AssembleError::Instrument(e)
    }
}

/// Output format and sample search shared by every build.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderSettings {
    pub format: RenderFormat,
    pub search: SearchOptions,
}

/// Builds prerendered instruments on a shared render coordinator.
pub struct Assembler {
    coordinator: Arc<RenderCoordinator>,
    library: Arc<dyn SampleLibrary>,
    loader: Arc<dyn BufferLoader>,
    settings: RenderSettings,
}

impl Assembler {
    pub fn new(
        coordinator: Arc<RenderCoordinator>,
        library: Arc<dyn SampleLibrary>,
        loader: Arc<dyn BufferLoader>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            coordinator,
            library,
            loader,
            settings,
        }
    }

    pub fn coordinator(&self) -> &Arc<RenderCoordinator> {
        &self.coordinator
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Pitch-shifted renders of every requested note.
    ///
    /// Keys of the result are the notes in canonical spelling (`C#4`).
    pub fn prerender_sampled_buffers(
        &self,
        samples: &Manifest,
        request: &SampledBuffersRequest,
    ) -> Result<BufferSet, AssembleError> {
        self.obtain(samples, &request.rendered_instrument, || {
            self.build_sampled(samples, request)
        })
    }

    /// [`prerender_sampled_buffers`](Self::prerender_sampled_buffers), then a
    /// sampler over the requested notes.
    pub fn prerender_sampler(
        &self,
        samples: &Manifest,
        request: &SampledBuffersRequest,
        options: SamplerOptions,
    ) -> Result<Sampler, AssembleError> {
        let rendered = self.prerender_sampled_buffers(samples, request)?;
        let by_note: BTreeMap<String, AudioBuffer> = request
            .notes
            .iter()
            .filter_map(|note| {
                let key = note.to_string();
                rendered.get(&key).cloned().map(|buffer| (key, buffer))
            })
            .collect();
        Ok(Sampler::new(SampleSet::Mapping(by_note), options)?.with_name(&request.rendered_instrument))
    }

    /// Re-render every recording of an instrument as is, keeping its shape.
    ///
    /// Array sets are rendered whole; keyed sets honour the key filter.
    pub fn prerender_buffers(
        &self,
        samples: &Manifest,
        request: &BuffersRequest,
    ) -> Result<BufferSet, AssembleError> {
        self.obtain(samples, &request.rendered_instrument, || {
            let sources = samples.require(&request.source_instrument)?;
            let selected = match sources {
                SampleSet::Array(_) => sources.clone(),
                SampleSet::Mapping(items) => SampleSet::Mapping(
                    items
                        .iter()
                        .filter(|(key, _)| request.accepts(key))
                        .map(|(key, source)| (key.clone(), source.clone()))
                        .collect(),
                ),
            };
            self.build_one_to_one(selected, request)
        })
    }

    /// [`prerender_buffers`](Self::prerender_buffers) for array sets only.
    pub fn prerender_buffer_array(
        &self,
        samples: &Manifest,
        request: &BuffersRequest,
    ) -> Result<Vec<AudioBuffer>, AssembleError> {
        let rendered = self.obtain(samples, &request.rendered_instrument, || {
            let sources = samples.require(&request.source_instrument)?;
            if !sources.is_array() {
                return Err(AssembleError::NotAnArray(request.source_instrument.clone()));
            }
            self.build_one_to_one(sources.clone(), request)
        })?;
        Ok(rendered.into_entries().into_iter().map(|(_, buffer)| buffer).collect())
    }

    /// Render each note on a fresh instrument and build a sampler from them.
    pub fn prerender_instrument(
        &self,
        samples: &Manifest,
        request: &InstrumentRequest,
    ) -> Result<Sampler, AssembleError> {
        let rendered = self.obtain(samples, &request.rendered_instrument, || {
            let format = self.settings.format;
            let pending: Vec<(String, PendingRender)> = request
                .notes
                .iter()
                .map(|note| {
                    let job = instrument_note_job(
                        *note,
                        request.note_duration,
                        request.create_instrument.clone(),
                        format,
                    );
                    (note.to_string(), self.coordinator.submit(job))
                })
                .collect();
            let rendered =
                SampleSet::Mapping(self.collect(pending, request.on_progress.as_ref())?.into_iter().collect());
            self.persist(&request.rendered_instrument, &rendered);
            Ok(rendered)
        })?;
        Ok(Sampler::new(rendered, request.sampler)?.with_name(&request.rendered_instrument))
    }

    /// Cached set for `name`, else the running build, else `build`.
    fn obtain(
        &self,
        samples: &Manifest,
        name: &str,
        build: impl FnOnce() -> BuildOutcome,
    ) -> BuildOutcome {
        if let Some(stored) = samples.get(name) {
            log::info!("'{name}' found in samples, skipping render");
            return Ok(create_buffers(stored, self.loader.as_ref())?);
        }
        if let Some(hit) = self.from_library(name) {
            return hit;
        }
        self.coordinator
            .builds()
            .run_or_cached(name, || self.from_library(name), || {
                log::info!("rendering '{name}'");
                build()
            })
    }

    fn from_library(&self, name: &str) -> Option<BuildOutcome> {
        match self.library.get(name) {
            Ok(Some(stored)) => {
                log::info!("'{name}' found in library, skipping render");
                Some(create_buffers(&stored, self.loader.as_ref()).map_err(AssembleError::from))
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("reading '{name}' from library failed, rendering instead: {e}");
                None
            }
        }
    }

    /// Saving is best effort: the build already succeeded.
    fn persist(&self, name: &str, rendered: &BufferSet) {
        match self.library.save(&[(name.to_string(), rendered.clone())]) {
            Ok(()) => log::debug!("saved '{name}' to library"),
            Err(e) => log::warn!("saving '{name}' to library failed: {e}"),
        }
    }

    fn build_sampled(&self, samples: &Manifest, request: &SampledBuffersRequest) -> BuildOutcome {
        let sources = samples.require(&request.source_instrument)?;
        let keys = sources.keys();

        // Every note must resolve before anything is queued.
        let resolved = request
            .notes
            .iter()
            .map(|note| {
                sample_note(note, &keys, request.pitch_shift, self.settings.search)
                    .map(|sampled| (note.to_string(), sampled))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Decode each recording once, all of them before the first submit.
        let mut decoded: HashMap<String, Arc<AudioBuffer>> = HashMap::new();
        for (_, sampled) in &resolved {
            if decoded.contains_key(&sampled.key) {
                continue;
            }
            let source = sources
                .get(&sampled.key)
                .ok_or_else(|| LoadError::MissingEntry(sampled.key.clone()))?;
            let mut buffer = create_buffer(source, self.loader.as_ref())?;
            if request.reverse {
                buffer.reverse();
            }
            decoded.insert(sampled.key.clone(), Arc::new(buffer));
        }

        let mut pending = Vec::with_capacity(resolved.len());
        for (note, sampled) in resolved {
            let buffer = decoded
                .get(&sampled.key)
                .cloned()
                .ok_or_else(|| LoadError::MissingEntry(sampled.key.clone()))?;

            let duration = stretched_duration(&buffer, sampled.playback_rate, request.additional_render_length);
            let settings = BufferRenderSettings {
                source: BufferSourceOptions {
                    playback_rate: sampled.playback_rate,
                    ..request.source_options
                },
                destination: request.destination.clone(),
                format: self.settings.format,
            };
            log::debug!(
                "{note}: {} at rate {:.4}",
                sampled.key,
                sampled.playback_rate
            );
            let label = format!("{}/{note}", request.rendered_instrument);
            pending.push((note, self.coordinator.submit(buffer_job(label, buffer, duration, &settings))));
        }

        let rendered =
            SampleSet::Mapping(self.collect(pending, request.on_progress.as_ref())?.into_iter().collect());
        self.persist(&request.rendered_instrument, &rendered);
        Ok(rendered)
    }

    fn build_one_to_one(&self, sources: SampleSet<SampleSource>, request: &BuffersRequest) -> BuildOutcome {
        let settings = BufferRenderSettings {
            source: request.source_options,
            destination: request.destination.clone(),
            format: self.settings.format,
        };
        let is_array = sources.is_array();

        let decoded = sources
            .entries()
            .into_iter()
            .map(|(key, source)| Ok((key, create_buffer(source, self.loader.as_ref())?)))
            .collect::<Result<Vec<_>, AssembleError>>()?;

        let mut pending = Vec::with_capacity(decoded.len());
        for (key, buffer) in decoded {
            let duration = stretched_duration(
                &buffer,
                request.source_options.playback_rate,
                request.additional_render_length,
            );
            let label = format!("{}/{key}", request.rendered_instrument);
            let job = buffer_job(label, Arc::new(buffer), duration, &settings);
            pending.push((key, self.coordinator.submit(job)));
        }

        let rendered = self.collect(pending, request.on_progress.as_ref())?;
        let rendered = if is_array {
            SampleSet::Array(rendered.into_iter().map(|(_, buffer)| buffer).collect())
        } else {
            SampleSet::Mapping(rendered.into_iter().collect())
        };
        self.persist(&request.rendered_instrument, &rendered);
        Ok(rendered)
    }

    /// Wait for queued renders in order, reporting progress after each.
    fn collect(
        &self,
        pending: Vec<(String, PendingRender)>,
        progress: Option<&ProgressFn>,
    ) -> Result<Vec<(String, AudioBuffer)>, AssembleError> {
        let total = pending.len();
        let mut rendered = Vec::with_capacity(total);
        for (done, (key, render)) in pending.into_iter().enumerate() {
            rendered.push((key, render.wait()?));
            report(progress, done + 1, total);
        }
        Ok(rendered)
    }
}

/// Build a sampler straight from a manifest entry, decoding as needed.
pub fn sampler_from_manifest(
    samples: &Manifest,
    instrument: &str,
    loader: &dyn BufferLoader,
    options: SamplerOptions,
) -> Result<Sampler, AssembleError> {
    let sources = samples.require(instrument)?;
    Ok(create_sampler(sources, loader, options)?.with_name(instrument))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Instrument, Synth};
    use crate::library::{LibraryError, MemoryLibrary};
    use crate::render::InstrumentFactory;
    use crate::runtime::OfflineContext;
    use crate::theory::Note;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const RATE: u32 = 100;

    /// Decodes any reference into a short ramp and counts decodes.
    #[derive(Default)]
    struct RampLoader {
        loads: AtomicUsize,
    }

    impl BufferLoader for RampLoader {
        fn load(&self, url: &str) -> Result<AudioBuffer, LoadError> {
            if url.starts_with("missing") {
                return Err(LoadError::Io {
                    url: url.to_string(),
                    message: "not found".to_string(),
                });
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(AudioBuffer::from_mono((0..10).map(|i| i as f32 / 10.0).collect(), RATE))
        }
    }

    struct BrokenLibrary;

    impl SampleLibrary for BrokenLibrary {
        fn get(&self, _name: &str) -> Result<Option<SampleSet<SampleSource>>, LibraryError> {
            Err(LibraryError::Format("unreadable".to_string()))
        }

        fn save(&self, _entries: &[(String, BufferSet)]) -> Result<(), LibraryError> {
            Err(LibraryError::Format("read-only".to_string()))
        }
    }

    fn settings() -> RenderSettings {
        RenderSettings {
            format: RenderFormat {
                sample_rate: RATE,
                channels: 1,
            },
            search: SearchOptions::default(),
        }
    }

    fn assembler_with(library: Arc<dyn SampleLibrary>, loader: Arc<RampLoader>) -> Assembler {
        Assembler::new(Arc::new(RenderCoordinator::new()), library, loader, settings())
    }

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{
                "piano": {"C4": "piano/c4.wav", "C5": "piano/c5.wav"},
                "kit": ["kit/kick.wav", "kit/snare.wav"]
            }"#,
        )
        .unwrap()
    }

    fn notes(names: &[&str]) -> Vec<Note> {
        names.iter().map(|n| Note::parse(n).unwrap()).collect()
    }

    #[test]
    fn renders_every_requested_note() {
        let library = Arc::new(MemoryLibrary::new());
        let loader = Arc::new(RampLoader::default());
        let assembler = assembler_with(library.clone(), loader.clone());
        let request = SampledBuffersRequest::new("piano", "piano-rendered", notes(&["C4", "D4", "C#5"]));

        let rendered = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        assert_eq!(rendered.keys(), vec!["C#5", "C4", "D4"]);
        assert_eq!(assembler.coordinator().renders_submitted(), 3);
        // C4 and C5 are each decoded once.
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        assert_eq!(library.saves(), 1);
        assert!(library.contains("piano-rendered").unwrap());
    }

    #[test]
    fn shifted_note_is_shorter() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4", "D4"]));
        let rendered = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        let exact = rendered.get("C4").unwrap();
        let shifted = rendered.get("D4").unwrap();
        assert_eq!(exact.len(), 10);
        assert!(shifted.len() < exact.len());
    }

    #[test]
    fn library_hit_renders_nothing() {
        let library = Arc::new(MemoryLibrary::new());
        library.insert(
            "piano-rendered",
            SampleSet::Mapping(BTreeMap::from([(
                "C4".to_string(),
                SampleSource::Buffer(AudioBuffer::from_mono(vec![0.5; 4], RATE)),
            )])),
        );
        let assembler = assembler_with(library.clone(), Arc::default());
        let request = SampledBuffersRequest::new("piano", "piano-rendered", notes(&["C4", "D4"]));

        let rendered = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        assert_eq!(rendered.keys(), vec!["C4"]);
        assert_eq!(assembler.coordinator().renders_submitted(), 0);
        assert_eq!(library.saves(), 0);
    }

    #[test]
    fn manifest_hit_renders_nothing() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = BuffersRequest::new("kit", "piano");
        let rendered = assembler.prerender_buffers(&manifest(), &request).unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(assembler.coordinator().renders_submitted(), 0);
    }

    #[test]
    fn second_build_comes_from_library() {
        let library = Arc::new(MemoryLibrary::new());
        let assembler = assembler_with(library.clone(), Arc::default());
        let request = SampledBuffersRequest::new("piano", "piano-rendered", notes(&["E4"]));

        let first = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        let second = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(assembler.coordinator().renders_submitted(), 1);
        assert_eq!(library.saves(), 1);
    }

    #[test]
    fn unreachable_note_fails_before_queueing() {
        let mut narrow = settings();
        narrow.search.max_interval = 3;
        let assembler = Assembler::new(
            Arc::new(RenderCoordinator::new()),
            Arc::new(MemoryLibrary::new()),
            Arc::new(RampLoader::default()),
            narrow,
        );
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4", "G4"]));

        let err = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap_err();
        assert!(matches!(
            err,
            AssembleError::Lookup(SampleLookupError::NoNearbySample(_))
        ));
        assert_eq!(assembler.coordinator().renders_submitted(), 0);
        assert!(assembler.coordinator().builds().is_empty());
    }

    #[test]
    fn missing_source_instrument() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = SampledBuffersRequest::new("harp", "harp-rendered", notes(&["C4"]));
        assert_eq!(
            assembler.prerender_sampled_buffers(&manifest(), &request),
            Err(AssembleError::Load(LoadError::MissingEntry("harp".to_string())))
        );
    }

    #[test]
    fn decode_failure_fails_build() {
        let manifest = Manifest::from_json(r#"{"piano": {"C4": "missing/c4.wav"}}"#).unwrap();
        let library = Arc::new(MemoryLibrary::new());
        let assembler = assembler_with(library.clone(), Arc::default());
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4"]));
        assert!(matches!(
            assembler.prerender_sampled_buffers(&manifest, &request),
            Err(AssembleError::Load(LoadError::Io { .. }))
        ));
        assert!(library.is_empty());
    }

    #[test]
    fn later_decode_failure_queues_nothing() {
        let manifest =
            Manifest::from_json(r#"{"piano": {"C4": "c4.wav", "C5": "missing/c5.wav"}}"#).unwrap();
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4", "C5"]));
        assert!(assembler.prerender_sampled_buffers(&manifest, &request).is_err());
        assert_eq!(assembler.coordinator().renders_submitted(), 0);
    }

    #[test]
    fn one_to_one_decode_failure_queues_nothing() {
        let manifest = Manifest::from_json(r#"{"kit": ["kit/kick.wav", "missing/snare.wav"]}"#).unwrap();
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = BuffersRequest::new("kit", "kit-rendered");
        assert!(assembler.prerender_buffer_array(&manifest, &request).is_err());
        assert_eq!(assembler.coordinator().renders_submitted(), 0);
    }

    #[test]
    fn progress_reaches_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4", "D4", "E4", "F4"]))
            .on_progress(move |fraction| recorder.lock().unwrap().push(fraction));

        assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn reverse_plays_backwards() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let mut request = SampledBuffersRequest::new("piano", "p", notes(&["C4"]));
        request.reverse = true;
        let rendered = assembler.prerender_sampled_buffers(&manifest(), &request).unwrap();
        let channel = rendered.get("C4").unwrap().channel(0);
        assert!(channel[0] > channel[9]);
    }

    #[test]
    fn failed_save_still_returns_buffers() {
        let assembler = assembler_with(Arc::new(BrokenLibrary), Arc::default());
        let request = SampledBuffersRequest::new("piano", "p", notes(&["C4"]));
        assert!(assembler.prerender_sampled_buffers(&manifest(), &request).is_ok());
        assert_eq!(assembler.coordinator().renders_submitted(), 1);
    }

    #[test]
    fn sampler_covers_requested_notes() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = SampledBuffersRequest::new("piano", "piano-rendered", notes(&["C4", "E4"]));
        let sampler = assembler
            .prerender_sampler(&manifest(), &request, SamplerOptions::default())
            .unwrap();
        assert_eq!(sampler.name(), "piano-rendered");
        assert_eq!(sampler.sampled_midi().collect::<Vec<_>>(), vec![60, 64]);
    }

    #[test]
    fn array_keeps_shape_and_order() {
        let library = Arc::new(MemoryLibrary::new());
        let assembler = assembler_with(library.clone(), Arc::default());
        let request = BuffersRequest::new("kit", "kit-rendered");
        let rendered = assembler.prerender_buffer_array(&manifest(), &request).unwrap();
        assert_eq!(rendered.len(), 2);
        assert!(library.get("kit-rendered").unwrap().unwrap().is_array());
    }

    #[test]
    fn array_of_keyed_set_is_an_error() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = BuffersRequest::new("piano", "piano-array");
        assert_eq!(
            assembler.prerender_buffer_array(&manifest(), &request),
            Err(AssembleError::NotAnArray("piano".to_string()))
        );
    }

    #[test]
    fn key_filter_limits_keyed_sets() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = BuffersRequest::new("piano", "piano-high").key_filter(|key| key.ends_with('5'));
        let rendered = assembler.prerender_buffers(&manifest(), &request).unwrap();
        assert_eq!(rendered.keys(), vec!["C5"]);
        assert_eq!(assembler.coordinator().renders_submitted(), 1);
    }

    #[test]
    fn one_to_one_honours_tail() {
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let mut request = BuffersRequest::new("kit", "kit-tail");
        request.additional_render_length = 0.05;
        let rendered = assembler.prerender_buffer_array(&manifest(), &request).unwrap();
        assert!(rendered[0].len() >= 15);
        assert!(rendered[0].channel(0)[10..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn instrument_prerender_builds_sampler() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory: InstrumentFactory = Arc::new(move |_: &OfflineContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Synth::default()) as Box<dyn Instrument>)
        });
        let assembler = assembler_with(Arc::new(MemoryLibrary::new()), Arc::default());
        let request = InstrumentRequest::new("synth-rendered", notes(&["A3", "A4"]), 0.2, factory);

        let sampler = assembler.prerender_instrument(&Manifest::default(), &request).unwrap();
        assert_eq!(sampler.sampled_midi().collect::<Vec<_>>(), vec![57, 69]);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sampler_straight_from_manifest() {
        let loader = RampLoader::default();
        let sampler = sampler_from_manifest(&manifest(), "piano", &loader, SamplerOptions::default()).unwrap();
        assert_eq!(sampler.name(), "piano");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }
}
