//! Audio blocks and the node trait.

use std::sync::Arc;

/// A planar block of audio positioned on a context timeline.
#[derive(Debug, Clone)]
pub struct AudioBlock {
    start_frame: u64,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBlock {
    /// A silent block starting at frame zero.
    pub fn new(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            start_frame: 0,
            sample_rate,
            channels: vec![vec![0.0; frames]; channels.max(1)],
        }
    }

    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Context time of the first frame, in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_frame as f64 / self.sample_rate as f64
    }

    /// Context time just past the last frame, in seconds.
    pub fn end_time(&self) -> f64 {
        (self.start_frame + self.frames() as u64) as f64 / self.sample_rate as f64
    }

    /// Context time of frame `index` within the block.
    pub fn frame_time(&self, index: usize) -> f64 {
        (self.start_frame + index as u64) as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.iter_mut().for_each(|s| *s = 0.0);
        }
    }

    /// Move to the next block position and clear.
    pub fn advance(&mut self) {
        self.start_frame += self.frames() as u64;
        self.clear();
    }

    /// Take the position, rate and shape of `other`, cleared.
    ///
    /// Only reallocates when the shape changes.
    pub fn conform_to(&mut self, other: &AudioBlock) {
        self.start_frame = other.start_frame;
        self.sample_rate = other.sample_rate;
        if self.channels.len() != other.channels.len() || self.frames() != other.frames() {
            self.channels = vec![vec![0.0; other.frames()]; other.channels.len()];
        } else {
            self.clear();
        }
    }

    /// Add `other` sample by sample. Extra channels or frames are ignored.
    pub fn mix_from(&mut self, other: &AudioBlock) {
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += *s;
            }
        }
    }

    /// Change the frame count, keeping the position. Contents are cleared.
    pub fn resize(&mut self, frames: usize) {
        for channel in self.channels.iter_mut() {
            channel.clear();
            channel.resize(frames, 0.0);
        }
    }
}

/// A processing node. Sources add into the block, effects transform it.
pub trait AudioNode: Send {
    fn process(&mut self, block: &mut AudioBlock);

    /// Release held resources. Processing after dispose produces nothing.
    fn dispose(&mut self) {}
}

/// Builds a fresh node per render, e.g. the destination chain of a prerender.
pub type NodeFactory = Arc<dyn Fn() -> Box<dyn AudioNode> + Send + Sync>;
