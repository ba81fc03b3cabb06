//! Audio engine — realtime output of one instrument on a cpal stream.
//!
//! [`AudioCommand`]s reach the audio thread over a lock-free ring and are
//! applied to the instrument before each block is pulled from it.

pub mod callback;
pub mod command;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Producer, Split},
    HeapRb,
};

pub use command::AudioCommand;

use crate::instrument::Instrument;
use crate::theory::Note;
use callback::AudioCallback;

/// Commands that can wait for the audio thread.
const COMMAND_CAPACITY: usize = 1024;

#[derive(Debug)]
pub enum AudioError {
    NoOutputDevice,
    /// The device refused to report or accept a stream configuration.
    Device(String),
    /// The output stream could not be built or started.
    Stream(String),
    /// The audio thread has fallen behind on commands.
    QueueFull,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::Device(e) => write!(f, "audio device error: {e}"),
            AudioError::Stream(e) => write!(f, "audio stream error: {e}"),
            AudioError::QueueFull => write!(f, "audio command queue is full"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Plays an instrument on the default output device.
pub struct AudioEngine {
    /// Output stops when the stream is dropped.
    _stream: cpal::Stream,
    producer: ringbuf::HeapProd<AudioCommand>,
    rejected: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: u16,
}

impl AudioEngine {
    /// Start at the device's preferred rate and channel count.
    pub fn new(instrument: Box<dyn Instrument>) -> Result<Self, AudioError> {
        let device = default_device()?;
        let preferred = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        Self::start(&device, instrument, preferred.sample_rate().0, preferred.channels())
    }

    /// Start at a fixed rate and channel count, e.g. the render format.
    pub fn with_config(
        instrument: Box<dyn Instrument>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        Self::start(&default_device()?, instrument, sample_rate, channels)
    }

    fn start(
        device: &cpal::Device,
        instrument: Box<dyn Instrument>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        let (producer, consumer) = HeapRb::<AudioCommand>::new(COMMAND_CAPACITY).split();

        log::info!(
            "starting audio output: {} at {sample_rate} Hz, {channels} channels",
            instrument.name()
        );
        let mut callback = AudioCallback::new(consumer, instrument, channels, sample_rate);
        let rejected = callback.rejected();

        let stream = device
            .build_output_stream(
                &cpal::StreamConfig {
                    channels,
                    sample_rate: cpal::SampleRate(sample_rate),
                    buffer_size: cpal::BufferSize::Default,
                },
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback.process(data),
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            producer,
            rejected,
            sample_rate,
            channels,
        })
    }

    /// Queue a command for the audio thread without blocking.
    pub fn send(&mut self, cmd: AudioCommand) -> Result<(), AudioError> {
        self.producer.try_push(cmd).map_err(|_| AudioError::QueueFull)
    }

    pub fn trigger_attack(&mut self, note: Note, velocity: f32) -> Result<(), AudioError> {
        self.send(AudioCommand::TriggerAttack { note, velocity })
    }

    pub fn trigger_release(&mut self, note: Note) -> Result<(), AudioError> {
        self.send(AudioCommand::TriggerRelease { note })
    }

    pub fn release_all(&mut self) -> Result<(), AudioError> {
        self.send(AudioCommand::ReleaseAll)
    }

    /// Master gain, clamped to 0.0..=1.0 on the audio thread.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.send(AudioCommand::SetVolume(volume))
    }

    /// Release every voice and mute until the next attack.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        self.send(AudioCommand::Stop)
    }

    /// Commands the instrument refused so far, e.g. notes out of sample range.
    pub fn rejected_commands(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn default_device() -> Result<cpal::Device, AudioError> {
    cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)
}
