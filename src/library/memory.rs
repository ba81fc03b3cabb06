//! In-memory library, for tests and sessions without persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{LibraryError, SampleLibrary};
use crate::sample::{BufferSet, SampleSet, SampleSource};

#[derive(Default)]
pub struct MemoryLibrary {
    entries: Mutex<HashMap<String, SampleSet<SampleSource>>>,
    saves: AtomicUsize,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry, e.g. with undecoded references.
    pub fn insert(&self, name: impl Into<String>, samples: SampleSet<SampleSource>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), samples);
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SampleLibrary for MemoryLibrary {
    fn get(&self, name: &str) -> Result<Option<SampleSet<SampleSource>>, LibraryError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    fn save(&self, entries: &[(String, BufferSet)]) -> Result<(), LibraryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (name, buffers) in entries {
            stored.insert(name.clone(), buffers.clone().into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::AudioBuffer;

    fn buffers() -> BufferSet {
        SampleSet::Array(vec![AudioBuffer::from_mono(vec![0.5], 44100)])
    }

    #[test]
    fn save_then_get() {
        let library = MemoryLibrary::new();
        assert_eq!(library.get("kit").unwrap(), None);
        library.save(&[("kit".to_string(), buffers())]).unwrap();
        let stored = library.get("kit").unwrap().unwrap();
        assert!(stored.is_decoded());
        assert!(library.contains("kit").unwrap());
        assert_eq!(library.saves(), 1);
    }

    #[test]
    fn resave_replaces() {
        let library = MemoryLibrary::new();
        library.save(&[("kit".to_string(), buffers())]).unwrap();
        library.save(&[("kit".to_string(), SampleSet::Array(vec![]))]).unwrap();
        assert_eq!(library.len(), 1);
        assert!(library.get("kit").unwrap().unwrap().is_empty());
    }

    #[test]
    fn inserted_references_are_returned_as_is() {
        let library = MemoryLibrary::new();
        library.insert("piano", SampleSet::Array(vec![SampleSource::from("c4.wav")]));
        let stored = library.get("piano").unwrap().unwrap();
        assert!(!stored.is_decoded());
        assert_eq!(library.saves(), 0);
    }
}
