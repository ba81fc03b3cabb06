//! Buffer source — one-shot playback of a decoded buffer at a playback rate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::node::{AudioBlock, AudioNode};
use crate::sample::AudioBuffer;

/// Shape of fade-in and fade-out ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    #[default]
    Linear,
    Exponential,
}

impl FadeCurve {
    /// Map ramp progress `x` in `[0, 1]` to a gain in `[0, 1]`.
    pub fn apply(self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => x,
            FadeCurve::Exponential => (2f64.powf(10.0 * x) - 1.0) / 1023.0,
        }
    }
}

/// Playback settings of a [`BufferSource`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSourceOptions {
    pub playback_rate: f64,
    pub gain: f32,
    /// Seconds.
    pub fade_in: f64,
    /// Seconds, applied before a scheduled stop and before the buffer runs out.
    pub fade_out: f64,
    pub curve: FadeCurve,
}

impl Default for BufferSourceOptions {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            gain: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            curve: FadeCurve::Linear,
        }
    }
}

/// Plays a shared buffer once, interpolating linearly between frames.
///
/// Buffer channels are spread over the output channels (mono feeds both sides
/// of a stereo block). Rate and sample-rate differences are folded into one
/// read step.
pub struct BufferSource {
    buffer: Arc<AudioBuffer>,
    options: BufferSourceOptions,
    start_time: Option<f64>,
    stop_time: Option<f64>,
    /// Read position in buffer frames.
    position: f64,
    ended: bool,
}

impl BufferSource {
    pub fn new(buffer: Arc<AudioBuffer>, options: BufferSourceOptions) -> Self {
        Self {
            buffer,
            options,
            start_time: None,
            stop_time: None,
            position: 0.0,
            ended: false,
        }
    }

    /// Begin playback at context time `time` (seconds).
    pub fn start(&mut self, time: f64) {
        self.start_time = Some(time.max(0.0));
    }

    /// Stop at context time `time`, fading out over `fade_out` from there.
    /// An earlier stop replaces a later one.
    pub fn stop(&mut self, time: f64) {
        self.stop_time = Some(match self.stop_time {
            Some(existing) => existing.min(time),
            None => time,
        });
    }

    pub fn set_fade_out(&mut self, seconds: f64) {
        self.options.fade_out = seconds.max(0.0);
    }

    pub fn options(&self) -> &BufferSourceOptions {
        &self.options
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Whether playback has finished, by running out, stopping, or disposal.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Seconds of output the whole buffer lasts at the current rate.
    pub fn playback_duration(&self) -> f64 {
        self.buffer.duration() / self.options.playback_rate
    }

    fn read(&self, channel: usize, position: f64) -> f32 {
        let data = self.buffer.channel(channel % self.buffer.number_of_channels());
        let idx = position as usize;
        let frac = (position - idx as f64) as f32;
        match (data.get(idx), data.get(idx + 1)) {
            (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
            (Some(&a), None) => a,
            _ => 0.0,
        }
    }

    /// Gain from the fade-out ramps at time `t`, or `None` once silent for good.
    fn fade_out_gain(&self, t: f64, seconds_left_in_buffer: f64) -> Option<f64> {
        let fade_out = self.options.fade_out;
        let mut gain = 1.0f64;
        if let Some(stop) = self.stop_time {
            if t >= stop {
                if fade_out <= 0.0 || t >= stop + fade_out {
                    return None;
                }
                gain = gain.min(self.options.curve.apply(1.0 - (t - stop) / fade_out));
            }
        }
        if fade_out > 0.0 && seconds_left_in_buffer < fade_out {
            gain = gain.min(self.options.curve.apply(seconds_left_in_buffer / fade_out));
        }
        Some(gain)
    }
}

impl AudioNode for BufferSource {
    fn process(&mut self, block: &mut AudioBlock) {
        let start = match self.start_time {
            Some(start) if !self.ended => start,
            _ => return,
        };
        if self.buffer.is_empty() || self.options.playback_rate <= 0.0 {
            self.ended = true;
            return;
        }

        let len = self.buffer.len() as f64;
        let step = self.options.playback_rate * self.buffer.sample_rate() as f64
            / block.sample_rate() as f64;
        let seconds_per_step = 1.0 / block.sample_rate() as f64;

        for i in 0..block.frames() {
            let t = block.frame_time(i);
            if t < start {
                continue;
            }
            if self.position >= len {
                self.ended = true;
                break;
            }

            let seconds_left = (len - self.position) / step * seconds_per_step;
            let fade_out = match self.fade_out_gain(t, seconds_left) {
                Some(gain) => gain,
                None => {
                    self.ended = true;
                    break;
                }
            };
            let elapsed = t - start;
            let fade_in = if self.options.fade_in > 0.0 && elapsed < self.options.fade_in {
                self.options.curve.apply(elapsed / self.options.fade_in)
            } else {
                1.0
            };
            let gain = self.options.gain * (fade_in * fade_out) as f32;

            for channel in 0..block.channel_count() {
                let sample = self.read(channel, self.position);
                block.channel_mut(channel)[i] += sample * gain;
            }
            self.position += step;
        }
    }

    fn dispose(&mut self) {
        self.ended = true;
    }
}
