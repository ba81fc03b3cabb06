//! Render strategies — what an offline render plays.
//!
//! Either a decoded buffer replayed through a buffer source (optionally at a
//! shifted rate) or an instrument playing a single note.

use std::sync::Arc;

use super::job::{RenderFormat, RenderJob};
use super::queue::RenderQueue;
use super::RenderError;
use crate::instrument::Instrument;
use crate::runtime::{AudioBlock, AudioNode, BufferSource, BufferSourceOptions, NodeFactory, OfflineContext, RenderSource};
use crate::sample::AudioBuffer;
use crate::theory::Note;

/// How buffers are replayed into a render.
#[derive(Clone, Default)]
pub struct BufferRenderSettings {
    pub source: BufferSourceOptions,
    /// Builds the effect chain the source plays through, fresh per render.
    pub destination: Option<NodeFactory>,
    pub format: RenderFormat,
}

/// Render length for a recording played at `playback_rate`, plus a tail.
pub fn stretched_duration(buffer: &AudioBuffer, playback_rate: f64, additional: f64) -> f64 {
    buffer.duration() / playback_rate + additional
}

struct BufferRender {
    source: BufferSource,
    destination: Option<Box<dyn AudioNode>>,
}

impl RenderSource for BufferRender {
    fn start(&mut self) -> Result<(), RenderError> {
        self.source.start(0.0);
        Ok(())
    }

    fn process(&mut self, block: &mut AudioBlock) {
        self.source.process(block);
        if let Some(destination) = self.destination.as_mut() {
            destination.process(block);
        }
    }

    fn dispose(&mut self) {
        self.source.dispose();
        if let Some(destination) = self.destination.as_mut() {
            destination.dispose();
        }
    }
}

/// A job replaying `buffer` for `duration` seconds.
pub fn buffer_job(
    label: impl Into<String>,
    buffer: Arc<AudioBuffer>,
    duration: f64,
    settings: &BufferRenderSettings,
) -> RenderJob {
    let options = settings.source;
    let destination = settings.destination.clone();
    RenderJob::new(label, duration, settings.format, move |_| {
        Ok(Box::new(BufferRender {
            source: BufferSource::new(buffer, options),
            destination: destination.map(|build| build()),
        }) as Box<dyn RenderSource>)
    })
}

/// Queue a buffer render and wait for it.
pub fn render_buffer(
    queue: &RenderQueue,
    buffer: Arc<AudioBuffer>,
    duration: f64,
    settings: &BufferRenderSettings,
) -> Result<AudioBuffer, RenderError> {
    queue.render(buffer_job("buffer", buffer, duration, settings))
}

/// Builds an instrument inside a render's offline context.
pub type InstrumentFactory =
    Arc<dyn Fn(&OfflineContext) -> Result<Box<dyn Instrument>, RenderError> + Send + Sync>;

struct InstrumentRender {
    instrument: Box<dyn Instrument>,
    note: Note,
    note_duration: f64,
}

impl RenderSource for InstrumentRender {
    fn start(&mut self) -> Result<(), RenderError> {
        self.instrument
            .trigger_attack_release(&self.note, self.note_duration, Some(0.0))
            .map_err(|e| RenderError::Source(e.to_string()))
    }

    fn process(&mut self, block: &mut AudioBlock) {
        self.instrument.process(block);
    }

    fn dispose(&mut self) {
        self.instrument.dispose();
    }
}

/// A job playing `note` on a fresh instrument for `note_duration` seconds.
pub fn instrument_note_job(
    note: Note,
    note_duration: f64,
    create_instrument: InstrumentFactory,
    format: RenderFormat,
) -> RenderJob {
    RenderJob::new(note.to_string(), note_duration, format, move |context| {
        let instrument = create_instrument(context)?;
        Ok(Box::new(InstrumentRender {
            instrument,
            note,
            note_duration,
        }) as Box<dyn RenderSource>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Synth, SynthOptions};
    use crate::runtime::Volume;
    use assert_approx_eq::assert_approx_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn settings(rate: f64) -> BufferRenderSettings {
        BufferRenderSettings {
            source: BufferSourceOptions {
                playback_rate: rate,
                ..Default::default()
            },
            destination: None,
            format: RenderFormat {
                sample_rate: 100,
                channels: 1,
            },
        }
    }

    fn ramp(len: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::from_mono((0..len).map(|i| i as f32).collect(), 100))
    }

    #[test]
    fn duration_accounts_for_rate_and_tail() {
        let buffer = AudioBuffer::from_mono(vec![0.0; 100], 100);
        assert_approx_eq!(stretched_duration(&buffer, 2.0, 0.5), 1.0);
        assert_approx_eq!(stretched_duration(&buffer, 0.5, 0.0), 2.0);
    }

    #[test]
    fn rerenders_at_shifted_rate() {
        let buffer = ramp(8);
        let duration = stretched_duration(&buffer, 2.0, 0.0);
        let rendered = buffer_job("x", buffer, duration, &settings(2.0)).run().unwrap();
        assert_eq!(rendered.channel(0), &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn tail_is_silent() {
        let rendered = buffer_job("x", ramp(2), 0.04, &settings(1.0)).run().unwrap();
        assert_eq!(rendered.channel(0), &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn destination_is_built_per_render_and_applied() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut s = settings(1.0);
        s.destination = Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(Volume::new(f32::NEG_INFINITY)) as Box<dyn AudioNode>
        }));
        let queue = RenderQueue::start();
        let a = render_buffer(&queue, ramp(4), 0.04, &s).unwrap();
        render_buffer(&queue, ramp(4), 0.04, &s).unwrap();
        assert!(a.channel(0).iter().all(|&v| v == 0.0));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn instrument_note_render() {
        let factory: InstrumentFactory =
            Arc::new(|_: &OfflineContext| Ok(Box::new(Synth::new(SynthOptions::default())) as Box<dyn Instrument>));
        let format = RenderFormat {
            sample_rate: 8000,
            channels: 1,
        };
        let job = instrument_note_job(Note::parse("A4").unwrap(), 0.25, factory, format);
        assert_eq!(job.label(), "A4");
        let rendered = job.run().unwrap();
        assert_eq!(rendered.len(), 2000);
        assert!(rendered.peak() > 0.01);
    }

    #[test]
    fn instrument_failure_is_a_render_failure() {
        let factory: InstrumentFactory =
            Arc::new(|_: &OfflineContext| Ok(Box::new(Synth::default()) as Box<dyn Instrument>));
        let job = instrument_note_job(Note::parse("A").unwrap(), 0.1, factory, RenderFormat::default());
        assert!(matches!(job.run(), Err(RenderError::Source(_))));
    }
}
