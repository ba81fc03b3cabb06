//! Render queue — a single worker thread that runs offline renders one at a
//! time in submission order.
//!
//! Jobs travel over an mpsc channel and every submitter gets its own reply
//! channel. A job that fails or panics is reported to its submitter and the
//! worker moves straight on to the next one.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use super::job::RenderJob;
use super::RenderError;
use crate::sample::AudioBuffer;

type RenderResult = Result<AudioBuffer, RenderError>;

struct Queued {
    job: RenderJob,
    reply: Sender<RenderResult>,
}

/// Handle to a submitted render.
pub struct PendingRender {
    label: String,
    receiver: Receiver<RenderResult>,
}

impl PendingRender {
    fn failed(label: String, error: RenderError) -> Self {
        let (reply, receiver) = mpsc::channel();
        let _ = reply.send(Err(error));
        Self { label, receiver }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Block until the job has run.
    pub fn wait(self) -> RenderResult {
        self.receiver.recv().unwrap_or(Err(RenderError::QueueClosed))
    }
}

/// FIFO queue of offline renders with at most one render in progress.
pub struct RenderQueue {
    sender: Mutex<Option<Sender<Queued>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    submitted: AtomicUsize,
    completed: Arc<AtomicUsize>,
}

impl RenderQueue {
    /// Spawn the worker thread.
    pub fn start() -> Self {
        let (sender, receiver) = mpsc::channel::<Queued>();
        let completed = Arc::new(AtomicUsize::new(0));
        let worker_completed = completed.clone();

        let worker = thread::Builder::new()
            .name("render-queue".into())
            .spawn(move || run_worker(receiver, worker_completed))
            .ok();
        if worker.is_none() {
            log::error!("failed to spawn render worker; renders will fail");
        }

        Self {
            sender: Mutex::new(worker.as_ref().map(|_| sender)),
            worker: Mutex::new(worker),
            submitted: AtomicUsize::new(0),
            completed,
        }
    }

    /// Append a job. It starts as soon as every earlier job has finished.
    pub fn submit(&self, job: RenderJob) -> PendingRender {
        let label = job.label().to_string();
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(sender) = sender else {
            return PendingRender::failed(label, RenderError::QueueClosed);
        };

        self.submitted.fetch_add(1, Ordering::SeqCst);
        let (reply, receiver) = mpsc::channel();
        if sender.send(Queued { job, reply }).is_err() {
            return PendingRender::failed(label, RenderError::QueueClosed);
        }
        log::debug!("queued render '{label}'");
        PendingRender { label, receiver }
    }

    /// Submit and wait.
    pub fn render(&self, job: RenderJob) -> RenderResult {
        self.submit(job).wait()
    }

    /// Number of jobs accepted so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Number of jobs that have finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs, let queued ones finish, and join the worker.
    pub fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(receiver: Receiver<Queued>, completed: Arc<AtomicUsize>) {
    for Queued { job, reply } in receiver {
        let label = job.label().to_string();
        let result = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
            .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))));
        match &result {
            Ok(buffer) => log::debug!("rendered '{label}' ({:.3}s)", buffer.duration()),
            Err(e) => log::warn!("render '{label}' failed: {e}"),
        }
        completed.fetch_add(1, Ordering::SeqCst);
        // The submitter may have stopped waiting.
        let _ = reply.send(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
