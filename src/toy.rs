//! Toy helpers — seedable randomness and the note pool the demo plays from.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::theory::{invert, major, toss, Note, PitchClass};

/// First inversion of C major over `octaves`.
pub fn note_pool(octaves: &[i32]) -> Vec<Note> {
    let tonic = Note::bare(PitchClass::C);
    toss(&invert(&major(&tonic), 1), octaves)
}

/// Random choices for the demo. Seeded pickers repeat their sequence.
pub struct NotePicker {
    rng: ChaCha8Rng,
}

impl NotePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Uniform in `[min, max)`. Equal bounds give `min`.
    pub fn random_between(&mut self, min: f64, max: f64) -> f64 {
        self.rng.gen::<f64>() * (max - min) + min
    }

    /// `None` for an empty slice.
    pub fn pick_random<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Shuffled copy; the input is left as is.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut shuffled = items.to_vec();
        shuffled.shuffle(&mut self.rng);
        shuffled
    }
}
