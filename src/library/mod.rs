//! Sample library — persistent store of sample sets keyed by instrument name.
//!
//! The assembler reads an entry before rendering and saves every set it
//! renders, so a second build of the same instrument is a lookup.

pub mod disk;
pub mod memory;

pub use disk::DiskLibrary;
pub use memory::MemoryLibrary;

use std::fmt;

use crate::sample::{BufferSet, LoadError, SampleSet, SampleSource};

/// Key-value store of sample sets.
pub trait SampleLibrary: Send + Sync {
    /// The set stored under `name`, if any.
    fn get(&self, name: &str) -> Result<Option<SampleSet<SampleSource>>, LibraryError>;

    /// Store every `(name, buffers)` pair, replacing existing entries.
    fn save(&self, entries: &[(String, BufferSet)]) -> Result<(), LibraryError>;

    fn contains(&self, name: &str) -> Result<bool, LibraryError> {
        Ok(self.get(name)?.is_some())
    }
}

/// Errors from reading or writing a library.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    Io { path: String, message: String },
    /// An index file could not be read or written.
    Format(String),
    /// A stored sample could not be decoded.
    Load(LoadError),
    /// The name cannot be used as a library key.
    InvalidName(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Io { path, message } => write!(f, "library I/O error at '{path}': {message}"),
            LibraryError::Format(e) => write!(f, "library index error: {e}"),
            LibraryError::Load(e) => write!(f, "library sample error: {e}"),
            LibraryError::InvalidName(name) => write!(f, "invalid library name '{name}'"),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<LoadError> for LibraryError {
    fn from(e: LoadError) -> Self {
        LibraryError::Load(e)
    }
}
