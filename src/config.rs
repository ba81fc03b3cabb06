//! Configuration — render format, sample search and demo settings loaded from
//! ~/.motion-piano/config.yaml.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::library::disk::default_library_dir;
use crate::render::RenderFormat;
use crate::sample::SearchOptions;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Yaml(e) => write!(f, "config YAML error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sample_rate: u32,
    pub channels: usize,
    pub search: SearchOptions,
    /// Seconds rendered after each stretched recording.
    pub additional_render_length: f64,
    pub pitch_shift: i32,
    pub library_dir: PathBuf,
    /// Manifest references resolve relative to this directory.
    pub samples_dir: PathBuf,
    /// Milliseconds between triggers in `play`.
    pub trigger_interval_ms: u64,
    pub octaves: Vec<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            search: SearchOptions::default(),
            additional_render_length: 0.0,
            pitch_shift: 0,
            library_dir: default_library_dir(),
            samples_dir: PathBuf::from("."),
            trigger_interval_ms: 200,
            octaves: vec![3, 4, 5],
        }
    }
}

impl Config {
    /// Standard location, `~/.motion-piano/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".motion-piano").join("config.yaml"))
    }

    /// Load from the standard path. A missing or unreadable file gives defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn render_format(&self) -> RenderFormat {
        RenderFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.search.max_interval, 96);
        assert!(config.search.prefer_upward);
        assert_eq!(config.octaves, vec![3, 4, 5]);
        assert_eq!(config.trigger_interval_ms, 200);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config: Config = serde_yaml::from_str("sample_rate: 22050\nsearch:\n  max_interval: 12\n").unwrap();
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.search.max_interval, 12);
        assert!(config.search.prefer_upward);
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            pitch_shift: -12,
            octaves: vec![4],
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "octaves: [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn render_format_follows_config() {
        let config = Config {
            sample_rate: 48000,
            channels: 1,
            ..Config::default()
        };
        assert_eq!(
            config.render_format(),
            RenderFormat {
                sample_rate: 48000,
                channels: 1
            }
        );
    }
}
