//! Decoded audio buffers — WAV decode/encode, linear resampling, reversal.

use std::io::{Read, Seek, Write};

use super::LoadError;

/// Decoded multi-channel audio at a known sample rate.
///
/// Channel data is owned, so cloning yields an independent copy.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create from planar channel data. All channels must share one length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        Self {
            channels,
            sample_rate,
        }
    }

    /// Create a single-channel buffer.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// A silent buffer of `frames` frames.
    pub fn silent(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self::from_channels(vec![vec![0.0; frames]; channels.max(1)], sample_rate)
    }

    /// Mono buffer from a flat array (the inverse of [`to_array`](Self::to_array)).
    pub fn from_array(samples: &[f32], sample_rate: u32) -> Self {
        Self::from_mono(samples.to_vec(), sample_rate)
    }

    /// Decode a WAV stream, resampling to `target_sample_rate` when it differs.
    ///
    /// 8/16/24/32-bit integer and 32-bit float files are accepted. Channel
    /// layout is kept.
    pub fn from_wav<R: Read + Seek>(reader: R, target_sample_rate: u32) -> Result<Self, LoadError> {
        let wav = hound::WavReader::new(reader).map_err(|e| LoadError::Decode(e.to_string()))?;
        let spec = wav.spec();
        let channel_count = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|e| LoadError::Decode(e.to_string()))?
            }
            hound::SampleFormat::Float => wav
                .into_samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| LoadError::Decode(e.to_string()))?,
        };

        if interleaved.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        if spec.sample_rate != target_sample_rate {
            for channel in channels.iter_mut() {
                *channel = resample_linear(channel, spec.sample_rate, target_sample_rate);
            }
        }

        Ok(Self::from_channels(channels, target_sample_rate))
    }

    /// Encode as 32-bit float WAV.
    pub fn write_wav<W: Write + Seek>(&self, writer: W) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: self.channels.len() as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut wav = hound::WavWriter::new(writer, spec)?;
        for frame in 0..self.len() {
            for channel in &self.channels {
                wav.write_sample(channel[frame])?;
            }
        }
        wav.finalize()
    }

    /// Mono mixdown as a flat array.
    pub fn to_array(&self) -> Vec<f32> {
        let count = self.channels.len() as f32;
        (0..self.len())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / count)
            .collect()
    }

    /// Reverse every channel in place.
    pub fn reverse(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.reverse();
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

/// Linear-interpolation resampling from `source_rate` to `target_rate`.
fn resample_linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.len() < 2 {
        return input.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (input.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            if idx + 1 < input.len() {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[idx.min(input.len() - 1)]
            }
        })
        .collect()
}
