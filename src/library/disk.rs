//! On-disk library — one directory per instrument with a YAML index and
//! numbered 32-bit float WAV files.
//!
//! ```text
//! <root>/piano-rendered/index.yaml
//! <root>/piano-rendered/0.wav
//! <root>/piano-rendered/1.wav
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{LibraryError, SampleLibrary};
use crate::sample::{AudioBuffer, BufferSet, SampleSet, SampleSource};

const INDEX_FILE: &str = "index.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Shape {
    Array,
    Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    key: String,
    file: String,
    sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Index {
    shape: Shape,
    entries: Vec<IndexEntry>,
}

/// Default library location, `~/.motion-piano/library`.
pub fn default_library_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".motion-piano");
    path.push("library");
    path
}

fn io_error(path: &Path, e: impl ToString) -> LibraryError {
    LibraryError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Library rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskLibrary {
    root: PathBuf,
}

impl DiskLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, name: &str) -> Result<PathBuf, LibraryError> {
        let usable = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name.chars().all(|c| !c.is_control());
        if usable {
            Ok(self.root.join(name))
        } else {
            Err(LibraryError::InvalidName(name.to_string()))
        }
    }

    fn write_entry(&self, name: &str, buffers: &BufferSet) -> Result<(), LibraryError> {
        let dir = self.entry_dir(name)?;
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        }
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let mut entries = Vec::with_capacity(buffers.len());
        for (i, (key, buffer)) in buffers.entries().into_iter().enumerate() {
            let file = format!("{i}.wav");
            let path = dir.join(&file);
            let writer = File::create(&path).map_err(|e| io_error(&path, e))?;
            buffer
                .write_wav(BufWriter::new(writer))
                .map_err(|e| io_error(&path, e))?;
            entries.push(IndexEntry {
                key,
                file,
                sample_rate: buffer.sample_rate(),
            });
        }

        let index = Index {
            shape: if buffers.is_array() {
                Shape::Array
            } else {
                Shape::Mapping
            },
            entries,
        };
        let yaml = serde_yaml::to_string(&index).map_err(|e| LibraryError::Format(e.to_string()))?;
        let index_path = dir.join(INDEX_FILE);
        fs::write(&index_path, yaml).map_err(|e| io_error(&index_path, e))?;
        log::debug!("saved '{name}' ({} buffers) to {}", buffers.len(), dir.display());
        Ok(())
    }

    fn read_entry(&self, dir: &Path) -> Result<SampleSet<SampleSource>, LibraryError> {
        let index_path = dir.join(INDEX_FILE);
        let content = fs::read_to_string(&index_path).map_err(|e| io_error(&index_path, e))?;
        let index: Index =
            serde_yaml::from_str(&content).map_err(|e| LibraryError::Format(e.to_string()))?;

        let mut decoded = Vec::with_capacity(index.entries.len());
        for entry in index.entries {
            let path = dir.join(&entry.file);
            let file = File::open(&path).map_err(|e| io_error(&path, e))?;
            let buffer = AudioBuffer::from_wav(BufReader::new(file), entry.sample_rate)?;
            decoded.push((entry.key, SampleSource::Buffer(buffer)));
        }

        Ok(match index.shape {
            Shape::Array => SampleSet::Array(decoded.into_iter().map(|(_, s)| s).collect()),
            Shape::Mapping => SampleSet::Mapping(decoded.into_iter().collect::<BTreeMap<_, _>>()),
        })
    }
}

impl SampleLibrary for DiskLibrary {
    fn get(&self, name: &str) -> Result<Option<SampleSet<SampleSource>>, LibraryError> {
        let dir = self.entry_dir(name)?;
        if !dir.join(INDEX_FILE).exists() {
            return Ok(None);
        }
        self.read_entry(&dir).map(Some)
    }

    fn save(&self, entries: &[(String, BufferSet)]) -> Result<(), LibraryError> {
        for (name, buffers) in entries {
            self.write_entry(name, buffers)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(value: f32) -> AudioBuffer {
        AudioBuffer::from_channels(vec![vec![value; 4], vec![-value; 4]], 22050)
    }

    fn keyed() -> BufferSet {
        let mut items = BTreeMap::new();
        items.insert("C4".to_string(), tone(0.25));
        items.insert("D4".to_string(), tone(0.5));
        SampleSet::Mapping(items)
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        assert_eq!(library.get("piano").unwrap(), None);
        assert!(!library.contains("piano").unwrap());
    }

    #[test]
    fn keyed_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        library.save(&[("piano".to_string(), keyed())]).unwrap();

        assert!(dir.path().join("piano").join("index.yaml").exists());
        let stored = library.get("piano").unwrap().unwrap();
        assert_eq!(stored.keys(), vec!["C4", "D4"]);
        assert_eq!(stored.get("D4"), Some(&SampleSource::Buffer(tone(0.5))));
    }

    #[test]
    fn array_shape_persists() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        let kit = SampleSet::Array(vec![tone(0.1), tone(0.2), tone(0.3)]);
        library.save(&[("kit".to_string(), kit)]).unwrap();

        let stored = library.get("kit").unwrap().unwrap();
        assert!(stored.is_array());
        assert_eq!(stored.get("2"), Some(&SampleSource::Buffer(tone(0.3))));
    }

    #[test]
    fn resave_replaces_files() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        library
            .save(&[("kit".to_string(), SampleSet::Array(vec![tone(0.1), tone(0.2)]))])
            .unwrap();
        library
            .save(&[("kit".to_string(), SampleSet::Array(vec![tone(0.9)]))])
            .unwrap();

        assert!(!dir.path().join("kit").join("1.wav").exists());
        let stored = library.get("kit").unwrap().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn saves_several_entries() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        library
            .save(&[
                ("a".to_string(), keyed()),
                ("b".to_string(), SampleSet::Array(vec![tone(0.1)])),
            ])
            .unwrap();
        assert!(library.contains("a").unwrap());
        assert!(library.contains("b").unwrap());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let library = DiskLibrary::new(dir.path());
        for name in ["", "../x", "a/b", ".hidden"] {
            assert_eq!(
                library.get(name),
                Err(LibraryError::InvalidName(name.to_string()))
            );
        }
    }

    #[test]
    fn corrupt_index_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("piano")).unwrap();
        fs::write(dir.path().join("piano").join("index.yaml"), "shape: [").unwrap();
        let library = DiskLibrary::new(dir.path());
        assert!(matches!(library.get("piano"), Err(LibraryError::Format(_))));
    }

    #[test]
    fn default_dir_is_under_home() {
        assert!(default_library_dir().ends_with(".motion-piano/library"));
    }
}
