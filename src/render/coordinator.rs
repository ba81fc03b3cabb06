//! Render coordinator — the session-wide render queue and in-flight build map.

use super::inflight::InFlight;
use super::job::RenderJob;
use super::queue::{PendingRender, RenderQueue};
use super::RenderError;
use crate::assemble::AssembleError;
use crate::sample::{AudioBuffer, BufferSet};

/// Result shared by every caller of one instrument build.
pub type BuildOutcome = Result<BufferSet, AssembleError>;

/// Owns the one render queue of a session and the builds running on it.
///
/// Created once at startup and shared as `Arc<RenderCoordinator>`; dropping
/// the last handle drains the queue and stops its worker.
pub struct RenderCoordinator {
    queue: RenderQueue,
    builds: InFlight<BuildOutcome>,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        log::debug!("starting render coordinator");
        Self {
            queue: RenderQueue::start(),
            builds: InFlight::new(),
        }
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn builds(&self) -> &InFlight<BuildOutcome> {
        &self.builds
    }

    pub fn submit(&self, job: RenderJob) -> PendingRender {
        self.queue.submit(job)
    }

    pub fn render(&self, job: RenderJob) -> Result<AudioBuffer, RenderError> {
        self.queue.render(job)
    }

    /// Jobs handed to the queue since startup.
    pub fn renders_submitted(&self) -> usize {
        self.queue.submitted()
    }

    /// Refuse new jobs and wait for queued ones.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }
}

impl Default for RenderCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
