//! Buffer acquisition — turn sample sources into independently owned buffers.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::buffer::AudioBuffer;
use super::set::{BufferSet, SampleSet, SampleSource};
use super::LoadError;

/// Decodes a sample reference into audio.
pub trait BufferLoader: Send + Sync {
    fn load(&self, url: &str) -> Result<AudioBuffer, LoadError>;
}

/// Loads WAV files relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    base_dir: PathBuf,
    sample_rate: u32,
}

impl FileLoader {
    /// Resolve relative references against `base_dir` and decode at `sample_rate`.
    pub fn new(base_dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            base_dir: base_dir.into(),
            sample_rate,
        }
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let trimmed = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(trimmed);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(trimmed.trim_start_matches('/'))
        }
    }
}

impl BufferLoader for FileLoader {
    fn load(&self, url: &str) -> Result<AudioBuffer, LoadError> {
        let path = self.resolve(url);
        log::debug!("decoding {}", path.display());
        let file = File::open(&path).map_err(|e| LoadError::Io {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        AudioBuffer::from_wav(BufReader::new(file), self.sample_rate)
    }
}

/// Produce an owned buffer from a source.
///
/// Decoded inputs are deep-copied, so the caller's buffer is never shared or
/// mutated; references are decoded through `loader`.
pub fn create_buffer(source: &SampleSource, loader: &dyn BufferLoader) -> Result<AudioBuffer, LoadError> {
    match source {
        SampleSource::Buffer(buffer) => Ok(buffer.clone()),
        SampleSource::Url(url) => loader.load(url),
    }
}

/// [`create_buffer`] for every entry, keeping array or mapping shape.
pub fn create_buffers(
    sources: &SampleSet<SampleSource>,
    loader: &dyn BufferLoader,
) -> Result<BufferSet, LoadError> {
    sources
        .clone()
        .try_map(|_, source| create_buffer(&source, loader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts loads and returns a one-sample buffer whose value encodes the url length.
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl BufferLoader for CountingLoader {
        fn load(&self, url: &str) -> Result<AudioBuffer, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if url.is_empty() {
                return Err(LoadError::Empty);
            }
            Ok(AudioBuffer::from_mono(vec![url.len() as f32], 44100))
        }
    }

    fn loader() -> CountingLoader {
        CountingLoader {
            loads: AtomicUsize::new(0),
        }
    }

    #[test]
    fn decoded_source_is_copied_without_loading() {
        let loader = loader();
        let original = AudioBuffer::from_mono(vec![0.5], 44100);
        let source = SampleSource::Buffer(original.clone());
        let mut copy = create_buffer(&source, &loader).unwrap();
        copy.channel_mut(0)[0] = 0.0;
        assert_eq!(source, SampleSource::Buffer(original));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn url_source_is_loaded() {
        let loader = loader();
        let buffer = create_buffer(&SampleSource::from("abc"), &loader).unwrap();
        assert_eq!(buffer.channel(0), &[3.0]);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn batch_keeps_shape_and_order() {
        let loader = loader();
        let array = SampleSet::Array(vec![SampleSource::from("a"), SampleSource::from("bb")]);
        let buffers = create_buffers(&array, &loader).unwrap();
        assert!(buffers.is_array());
        assert_eq!(buffers.get("1").unwrap().channel(0), &[2.0]);

        let mut items = BTreeMap::new();
        items.insert("C4".to_string(), SampleSource::from("ccc"));
        let buffers = create_buffers(&SampleSet::Mapping(items), &loader).unwrap();
        assert_eq!(buffers.get("C4").unwrap().channel(0), &[3.0]);
    }

    #[test]
    fn batch_fails_on_first_error() {
        let loader = loader();
        let array = SampleSet::Array(vec![SampleSource::from("a"), SampleSource::from("")]);
        assert_eq!(create_buffers(&array, &loader), Err(LoadError::Empty));
    }

    #[test]
    fn file_loader_resolves_paths() {
        let loader = FileLoader::new("/samples", 44100);
        assert_eq!(loader.resolve("piano/c4.wav"), PathBuf::from("/samples/piano/c4.wav"));
        assert_eq!(loader.resolve("/piano/c4.wav"), PathBuf::from("/piano/c4.wav"));
        assert_eq!(loader.resolve("file:///x/a.wav"), PathBuf::from("/x/a.wav"));
    }

    #[test]
    fn file_loader_reads_wav() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = AudioBuffer::from_mono(vec![0.25, -0.25], 44100);
        let file = File::create(dir.path().join("tone.wav")).unwrap();
        buffer.write_wav(std::io::BufWriter::new(file)).unwrap();

        let loader = FileLoader::new(dir.path(), 44100);
        assert_eq!(loader.load("tone.wav").unwrap(), buffer);
        assert!(matches!(loader.load("missing.wav"), Err(LoadError::Io { .. })));
    }
}
