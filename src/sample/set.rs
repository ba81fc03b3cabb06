//! Sample sets — array-indexed or key-indexed collections of sample sources
//! and decoded buffers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use super::buffer::AudioBuffer;

/// Where a sample comes from: an already decoded buffer or a reference to decode.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleSource {
    Buffer(AudioBuffer),
    Url(String),
}

impl SampleSource {
    pub fn is_decoded(&self) -> bool {
        matches!(self, SampleSource::Buffer(_))
    }
}

impl From<AudioBuffer> for SampleSource {
    fn from(buffer: AudioBuffer) -> Self {
        SampleSource::Buffer(buffer)
    }
}

impl From<&str> for SampleSource {
    fn from(url: &str) -> Self {
        SampleSource::Url(url.to_string())
    }
}

/// Manifests only ever carry references.
impl<'de> Deserialize<'de> for SampleSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SampleSource::Url)
    }
}

/// A collection of samples keyed either by position or by name.
///
/// Array sets keep index order, mapping sets iterate in key order. Array
/// entries are addressed by their decimal index (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SampleSet<T> {
    Array(Vec<T>),
    Mapping(BTreeMap<String, T>),
}

/// Decoded buffers keyed like their sources.
pub type BufferSet = SampleSet<AudioBuffer>;

impl<T> SampleSet<T> {
    pub fn len(&self) -> usize {
        match self {
            SampleSet::Array(items) => items.len(),
            SampleSet::Mapping(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SampleSet::Array(_))
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            SampleSet::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            SampleSet::Mapping(items) => items.get(key),
        }
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> Vec<String> {
        match self {
            SampleSet::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            SampleSet::Mapping(items) => items.keys().cloned().collect(),
        }
    }

    /// `(key, value)` pairs in iteration order.
    pub fn entries(&self) -> Vec<(String, &T)> {
        match self {
            SampleSet::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect(),
            SampleSet::Mapping(items) => items.iter().map(|(k, v)| (k.clone(), v)).collect(),
        }
    }

    /// Owned `(key, value)` pairs in iteration order.
    pub fn into_entries(self) -> Vec<(String, T)> {
        match self {
            SampleSet::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect(),
            SampleSet::Mapping(items) => items.into_iter().collect(),
        }
    }

    /// Transform every value, keeping the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> SampleSet<U> {
        match self {
            SampleSet::Array(items) => SampleSet::Array(items.into_iter().map(f).collect()),
            SampleSet::Mapping(items) => {
                SampleSet::Mapping(items.into_iter().map(|(k, v)| (k, f(v))).collect())
            }
        }
    }

    /// Fallible [`map`](Self::map) that stops at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(&str, T) -> Result<U, E>) -> Result<SampleSet<U>, E> {
        Ok(match self {
            SampleSet::Array(items) => SampleSet::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| f(&i.to_string(), v))
                    .collect::<Result<_, _>>()?,
            ),
            SampleSet::Mapping(items) => SampleSet::Mapping(
                items
                    .into_iter()
                    .map(|(k, v)| f(&k, v).map(|u| (k, u)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl SampleSet<SampleSource> {
    /// Whether every entry is already decoded.
    pub fn is_decoded(&self) -> bool {
        self.entries().iter().all(|(_, source)| source.is_decoded())
    }
}

impl From<BufferSet> for SampleSet<SampleSource> {
    fn from(buffers: BufferSet) -> Self {
        buffers.map(SampleSource::Buffer)
    }
}
