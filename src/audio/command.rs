//! Commands sent from the main thread to the audio thread via ring buffer.

use crate::theory::Note;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    /// Start `note` at the next block.
    TriggerAttack { note: Note, velocity: f32 },

    TriggerRelease { note: Note },

    /// Fade out every sounding voice.
    ReleaseAll,

    /// Set master volume (0.0 to 1.0).
    SetVolume(f32),

    /// Cut every voice and output silence until the next attack.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{
        traits::{Consumer, Producer, Split},
        HeapRb,
    };

    fn note(name: &str) -> Note {
        Note::parse(name).unwrap()
    }

    #[test]
    fn trigger_survives_the_queue() {
        let rb = HeapRb::<AudioCommand>::new(16);
        let (mut prod, mut cons) = rb.split();

        prod.try_push(AudioCommand::TriggerAttack {
            note: note("E4"),
            velocity: 0.8,
        })
        .unwrap();

        assert_eq!(
            cons.try_pop(),
            Some(AudioCommand::TriggerAttack {
                note: note("E4"),
                velocity: 0.8
            })
        );
    }

    #[test]
    fn ordering_preserved() {
        let rb = HeapRb::<AudioCommand>::new(16);
        let (mut prod, mut cons) = rb.split();

        prod.try_push(AudioCommand::SetVolume(0.5)).unwrap();
        prod.try_push(AudioCommand::TriggerRelease { note: note("C4") }).unwrap();
        prod.try_push(AudioCommand::ReleaseAll).unwrap();
        prod.try_push(AudioCommand::Stop).unwrap();

        assert!(matches!(cons.try_pop(), Some(AudioCommand::SetVolume(_))));
        assert!(matches!(cons.try_pop(), Some(AudioCommand::TriggerRelease { .. })));
        assert_eq!(cons.try_pop(), Some(AudioCommand::ReleaseAll));
        assert_eq!(cons.try_pop(), Some(AudioCommand::Stop));
        assert!(cons.try_pop().is_none());
    }

    #[test]
    fn full_queue_rejects() {
        let rb = HeapRb::<AudioCommand>::new(1);
        let (mut prod, _cons) = rb.split();
        prod.try_push(AudioCommand::ReleaseAll).unwrap();
        assert!(prod.try_push(AudioCommand::Stop).is_err());
    }
}
