//! Offline render pipeline — a serial render queue, the jobs it runs, and the
//! bookkeeping that keeps concurrent instrument builds from duplicating work.
//!
//! ```text
//! RenderCoordinator ──► RenderQueue (worker thread, FIFO) ──► RenderJob::run
//!        │                                                  (OfflineContext + source)
//!        └──► InFlight<BuildOutcome> (one build per rendered name)
//! ```

pub mod coordinator;
pub mod error;
pub mod inflight;
pub mod job;
pub mod queue;
pub mod strategy;

pub use coordinator::{BuildOutcome, RenderCoordinator};
pub use error::RenderError;
pub use inflight::InFlight;
pub use job::{RenderFormat, RenderJob, SourceFactory};
pub use queue::{PendingRender, RenderQueue};
pub use strategy::{
    buffer_job, instrument_note_job, render_buffer, stretched_duration, BufferRenderSettings,
    InstrumentFactory,
};
