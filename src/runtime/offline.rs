//! Offline rendering — run a source for a fixed duration, faster than realtime.

use super::node::AudioBlock;
use crate::render::RenderError;
use crate::sample::AudioBuffer;

/// Frames processed per pull.
pub const RENDER_QUANTUM: usize = 128;

/// Something an offline context can play: started once, pulled block by
/// block, disposed by whoever created it.
pub trait RenderSource: Send {
    fn start(&mut self) -> Result<(), RenderError>;

    fn process(&mut self, block: &mut AudioBlock);

    fn dispose(&mut self);
}

/// A disconnected rendering context of fixed length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineContext {
    sample_rate: u32,
    channels: usize,
    frames: usize,
}

impl OfflineContext {
    /// A context lasting `duration` seconds. The duration must be finite and positive.
    pub fn new(duration: f64, sample_rate: u32, channels: usize) -> Result<Self, RenderError> {
        if !duration.is_finite() || duration <= 0.0 || sample_rate == 0 {
            return Err(RenderError::InvalidDuration(duration));
        }
        Ok(Self {
            sample_rate,
            channels: channels.max(1),
            frames: (duration * sample_rate as f64).ceil() as usize,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn duration(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Start `source` at time zero and render the full length.
    pub fn render(&self, source: &mut dyn RenderSource) -> Result<AudioBuffer, RenderError> {
        source.start()?;

        let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(self.frames); self.channels];
        let mut block = AudioBlock::new(self.channels, RENDER_QUANTUM, self.sample_rate);
        let mut rendered = 0;

        while rendered < self.frames {
            source.process(&mut block);
            let take = RENDER_QUANTUM.min(self.frames - rendered);
            for (channel, out) in output.iter_mut().enumerate() {
                out.extend_from_slice(&block.channel(channel)[..take]);
            }
            rendered += take;
            block.advance();
        }

        Ok(AudioBuffer::from_channels(output, self.sample_rate))
    }
}
