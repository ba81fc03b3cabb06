//! Motion Piano — a motion-triggered piano toy built on prerendered samples.
//!
//! A few recordings per instrument are stretched into one buffer per playable
//! note ahead of time, cached in a sample library and played back by a
//! sampler with no pitch shifting at trigger time.

pub mod assemble;
pub mod audio;
pub mod config;
pub mod instrument;
pub mod library;
pub mod render;
pub mod runtime;
pub mod sample;
pub mod stage;
pub mod theory;
pub mod toy;
