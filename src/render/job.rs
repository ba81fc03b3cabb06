//! Render jobs — one offline render with guaranteed source disposal.

use serde::{Deserialize, Serialize};

use super::RenderError;
use crate::runtime::{OfflineContext, RenderSource};
use crate::sample::AudioBuffer;

/// Output format of offline renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFormat {
    pub sample_rate: u32,
    pub channels: usize,
}

impl Default for RenderFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Builds the source for one render inside its offline context.
pub type SourceFactory =
    Box<dyn FnOnce(&OfflineContext) -> Result<Box<dyn RenderSource>, RenderError> + Send>;

/// A pending offline render.
pub struct RenderJob {
    label: String,
    duration: f64,
    format: RenderFormat,
    create_source: SourceFactory,
}

/// Disposes the wrapped source when dropped, including on error and unwind.
struct DisposeGuard(Box<dyn RenderSource>);

impl Drop for DisposeGuard {
    fn drop(&mut self) {
        self.0.dispose();
    }
}

impl RenderJob {
    pub fn new<F>(label: impl Into<String>, duration: f64, format: RenderFormat, create_source: F) -> Self
    where
        F: FnOnce(&OfflineContext) -> Result<Box<dyn RenderSource>, RenderError> + Send + 'static,
    {
        Self {
            label: label.into(),
            duration,
            format,
            create_source: Box::new(create_source),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Create the context and source, render, and dispose the source.
    pub fn run(self) -> Result<AudioBuffer, RenderError> {
        let context = OfflineContext::new(self.duration, self.format.sample_rate, self.format.channels)?;
        let mut source = DisposeGuard((self.create_source)(&context)?);
        context.render(source.0.as_mut())
    }
}
