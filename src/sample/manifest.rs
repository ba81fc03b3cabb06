//! Samples manifest — instrument name → sample references, read from JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::set::{SampleSet, SampleSource};
use super::LoadError;

/// Instrument name → array or mapping of sample sources.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    instruments: BTreeMap<String, SampleSet<SampleSource>>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(|e| LoadError::Manifest(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            url: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn get(&self, instrument: &str) -> Option<&SampleSet<SampleSource>> {
        self.instruments.get(instrument)
    }

    /// Like [`get`](Self::get), but a missing instrument is an error.
    pub fn require(&self, instrument: &str) -> Result<&SampleSet<SampleSource>, LoadError> {
        self.get(instrument)
            .ok_or_else(|| LoadError::MissingEntry(instrument.to_string()))
    }

    pub fn insert(&mut self, instrument: impl Into<String>, samples: SampleSet<SampleSource>) {
        self.instruments.insert(instrument.into(), samples);
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "piano": {"C4": "piano/c4.wav", "C5": "piano/c5.wav"},
        "drums": ["drums/kick.wav", "drums/snare.wav"]
    }"#;

    #[test]
    fn parses_both_shapes() {
        let manifest = Manifest::from_json(JSON).unwrap();
        assert_eq!(manifest.instruments().collect::<Vec<_>>(), vec!["drums", "piano"]);
        assert!(manifest.get("drums").unwrap().is_array());
        assert_eq!(
            manifest.get("piano").unwrap().get("C5"),
            Some(&SampleSource::Url("piano/c5.wav".into()))
        );
    }

    #[test]
    fn missing_instrument() {
        let manifest = Manifest::from_json(JSON).unwrap();
        assert_eq!(
            manifest.require("violin"),
            Err(LoadError::MissingEntry("violin".into()))
        );
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(
            Manifest::from_json(r#"{"piano": 3}"#),
            Err(LoadError::Manifest(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        std::fs::write(&path, JSON).unwrap();
        assert!(Manifest::load(&path).unwrap().get("piano").is_some());
        assert!(matches!(
            Manifest::load(&dir.path().join("nope.json")),
            Err(LoadError::Io { .. })
        ));
    }
}
