//! Render failures.

use std::fmt;

/// Errors that can occur while producing a rendered buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Render length is not a finite positive number of seconds.
    InvalidDuration(f64),
    /// Building or starting the render source failed.
    Source(String),
    /// The job panicked; the queue carried on without it.
    Panicked(String),
    /// The queue was shut down before the job could run.
    QueueClosed,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidDuration(d) => write!(f, "invalid render duration: {d}s"),
            RenderError::Source(e) => write!(f, "render source error: {e}"),
            RenderError::Panicked(e) => write!(f, "render job panicked: {e}"),
            RenderError::QueueClosed => write!(f, "render queue is shut down"),
        }
    }
}

impl std::error::Error for RenderError {}
