//! Audio callback — runs on the cpal audio thread.
//!
//! Drains commands from the ring buffer, pulls one block from the instrument,
//! then interleaves it into the output with master volume and a hard clip.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::AudioCommand;
use crate::instrument::Instrument;
use crate::runtime::AudioBlock;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct AudioCallback {
    consumer: HeapCons<AudioCommand>,
    instrument: Box<dyn Instrument>,
    block: AudioBlock,
    volume: f32,
    stopped: bool,
    channels: u16,
    /// Commands the instrument refused; read from other threads.
    rejected: Arc<AtomicUsize>,
}

impl AudioCallback {
    pub fn new(
        consumer: HeapCons<AudioCommand>,
        instrument: Box<dyn Instrument>,
        channels: u16,
        sample_rate: u32,
    ) -> Self {
        Self {
            consumer,
            instrument,
            block: AudioBlock::new(channels as usize, 0, sample_rate),
            volume: 1.0,
            stopped: false,
            channels,
            rejected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of commands the instrument failed to apply.
    pub fn rejected(&self) -> Arc<AtomicUsize> {
        self.rejected.clone()
    }

    fn apply(&mut self, cmd: AudioCommand) {
        let result = match cmd {
            AudioCommand::TriggerAttack { note, velocity } => {
                self.stopped = false;
                self.instrument.trigger_attack(&note, None, velocity)
            }
            AudioCommand::TriggerRelease { note } => self.instrument.trigger_release(&note, None),
            AudioCommand::ReleaseAll => self.instrument.release_all(None),
            AudioCommand::SetVolume(v) => {
                self.volume = v.clamp(0.0, 1.0);
                Ok(())
            }
            AudioCommand::Stop => {
                self.stopped = true;
                self.instrument.release_all(None)
            }
        };
        if result.is_err() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Called by cpal with an interleaved output buffer.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            self.apply(cmd);
        }

        let channels = self.channels.max(1) as usize;
        let frames = output.len() / channels;
        if self.block.frames() != frames {
            self.block.resize(frames);
        }
        self.instrument.process(&mut self.block);

        let gain = if self.stopped { 0.0 } else { self.volume };
        for (frame, out) in output.chunks_mut(channels).enumerate() {
            for (ch, sample) in out.iter_mut().enumerate() {
                let value = if frame < frames {
                    self.block.channel(ch.min(self.block.channel_count() - 1))[frame]
                } else {
                    0.0
                };
                *sample = (value * gain).clamp(-1.0, 1.0);
            }
        }

        self.block.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentError;
    use crate::runtime::AudioNode;
    use crate::theory::Note;
    use ringbuf::{
        traits::{Producer, Split},
        HeapRb,
    };

    /// Constant output at the velocity of the last attack.
    struct Drone {
        level: f32,
        now: f64,
        disposed: bool,
    }

    impl AudioNode for Drone {
        fn process(&mut self, block: &mut AudioBlock) {
            for channel in block.channels_mut() {
                channel.iter_mut().for_each(|s| *s += self.level);
            }
            self.now = block.end_time();
        }
    }

    impl Instrument for Drone {
        fn trigger_attack(&mut self, _note: &Note, _time: Option<f64>, velocity: f32) -> Result<(), InstrumentError> {
            if self.disposed {
                return Err(InstrumentError::Disposed {
                    operation: "trigger_attack",
                });
            }
            self.level = velocity;
            Ok(())
        }

        fn trigger_release(&mut self, _note: &Note, _time: Option<f64>) -> Result<(), InstrumentError> {
            self.level = 0.0;
            Ok(())
        }

        fn release_all(&mut self, _time: Option<f64>) -> Result<(), InstrumentError> {
            self.level = 0.0;
            Ok(())
        }

        fn now(&self) -> f64 {
            self.now
        }

        fn name(&self) -> &str {
            "drone"
        }
    }

    fn setup(disposed: bool) -> (ringbuf::HeapProd<AudioCommand>, AudioCallback) {
        let rb = HeapRb::<AudioCommand>::new(16);
        let (prod, cons) = rb.split();
        let drone = Drone {
            level: 0.0,
            now: 0.0,
            disposed,
        };
        (prod, AudioCallback::new(cons, Box::new(drone), 2, 100))
    }

    fn attack(velocity: f32) -> AudioCommand {
        AudioCommand::TriggerAttack {
            note: Note::parse("C4").unwrap(),
            velocity,
        }
    }

    #[test]
    fn silence_without_notes() {
        let (_prod, mut callback) = setup(false);
        let mut output = vec![999.0f32; 64];
        callback.process(&mut output);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn attack_sounds_on_every_channel() {
        let (mut prod, mut callback) = setup(false);
        prod.try_push(attack(0.5)).unwrap();
        let mut output = vec![0.0f32; 8];
        callback.process(&mut output);
        assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn volume_scales_and_clamps() {
        let (mut prod, mut callback) = setup(false);
        prod.try_push(AudioCommand::SetVolume(1.5)).unwrap();
        prod.try_push(attack(0.8)).unwrap();
        let mut output = vec![0.0f32; 4];
        callback.process(&mut output);
        assert!((output[0] - 0.8).abs() < 1e-6);

        prod.try_push(AudioCommand::SetVolume(0.5)).unwrap();
        callback.process(&mut output);
        assert!((output[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn output_is_clipped() {
        let (mut prod, mut callback) = setup(false);
        prod.try_push(attack(3.0)).unwrap();
        let mut output = vec![0.0f32; 4];
        callback.process(&mut output);
        assert!(output.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn stop_silences_until_next_attack() {
        let (mut prod, mut callback) = setup(false);
        prod.try_push(attack(0.5)).unwrap();
        prod.try_push(AudioCommand::Stop).unwrap();
        let mut output = vec![999.0f32; 8];
        callback.process(&mut output);
        assert!(output.iter().all(|&s| s == 0.0));

        prod.try_push(attack(0.25)).unwrap();
        callback.process(&mut output);
        assert!((output[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn time_advances_across_calls() {
        let (_prod, mut callback) = setup(false);
        let mut output = vec![0.0f32; 20];
        callback.process(&mut output);
        callback.process(&mut output);
        assert!((callback.instrument.now() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn refused_commands_are_counted() {
        let (mut prod, mut callback) = setup(true);
        let rejected = callback.rejected();
        prod.try_push(attack(0.5)).unwrap();
        let mut output = vec![0.0f32; 4];
        callback.process(&mut output);
        assert_eq!(rejected.load(Ordering::Relaxed), 1);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn buffer_size_changes_are_followed() {
        let (mut prod, mut callback) = setup(false);
        prod.try_push(attack(0.5)).unwrap();
        let mut small = vec![0.0f32; 4];
        let mut large = vec![0.0f32; 16];
        callback.process(&mut small);
        callback.process(&mut large);
        assert!(large.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }
}
