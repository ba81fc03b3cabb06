//! Sample acquisition — decoded buffers, sample sets, manifests, loading and
//! closest-sample lookup.

pub mod buffer;
pub mod closest;
pub mod loader;
pub mod manifest;
pub mod set;

pub use buffer::AudioBuffer;
pub use closest::{
    get_closest_note, interval_to_frequency_ratio, key_to_midi, sample_note, NoNearbySampleError,
    SampleLookupError, SampledNote, SearchOptions,
};
pub use loader::{create_buffer, create_buffers, BufferLoader, FileLoader};
pub use manifest::Manifest;
pub use set::{BufferSet, SampleSet, SampleSource};

use std::fmt;

/// Errors that can occur when acquiring sample data.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Reading the referenced file failed.
    Io { url: String, message: String },
    /// The data is not decodable audio.
    Decode(String),
    /// The audio contains no samples.
    Empty,
    /// A manifest or set has no entry under this name.
    MissingEntry(String),
    /// The manifest itself is malformed.
    Manifest(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { url, message } => write!(f, "failed to read '{url}': {message}"),
            LoadError::Decode(e) => write!(f, "decode error: {e}"),
            LoadError::Empty => write!(f, "audio contains no samples"),
            LoadError::MissingEntry(name) => write!(f, "no samples for '{name}'"),
            LoadError::Manifest(e) => write!(f, "invalid manifest: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}
