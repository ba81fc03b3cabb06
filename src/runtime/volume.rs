//! Volume node — gain in decibels.

use super::node::{AudioBlock, AudioNode};

/// Scales a block by a decibel gain. `-inf` dB mutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    db: f32,
}

impl Volume {
    pub fn new(db: f32) -> Self {
        Self { db }
    }

    pub fn db(&self) -> f32 {
        self.db
    }

    pub fn set_db(&mut self, db: f32) {
        self.db = db;
    }

    /// Linear gain factor.
    pub fn gain(&self) -> f32 {
        if self.db == f32::NEG_INFINITY {
            0.0
        } else {
            10f32.powf(self.db / 20.0)
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl AudioNode for Volume {
    fn process(&mut self, block: &mut AudioBlock) {
        let gain = self.gain();
        if gain == 1.0 {
            return;
        }
        for channel in block.channels_mut() {
            channel.iter_mut().for_each(|s| *s *= gain);
        }
    }
}
