//! Stage activation — a scheduling activity that can be torn down exactly once.
//!
//! `schedule` starts a piece and may hand back an end callback. Deactivating
//! the stage ends every piece still running, then runs the stage's own
//! teardown. After that, scheduling is an error.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Ends a scheduled piece.
pub type EndFn = Box<dyn FnOnce() + Send>;

/// Starts a piece; `None` when the piece needs no explicit end.
pub type ScheduleFn = Box<dyn FnMut() -> Option<EndFn> + Send>;

/// Stage teardown.
pub type DeactivateFn = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageError {
    /// `schedule` was called after `deactivate`.
    Deactivated,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Deactivated => write!(f, "can't schedule after deactivation"),
        }
    }
}

impl std::error::Error for StageError {}

type EndSlot = Arc<Mutex<Option<EndFn>>>;

/// Slots of running pieces. Handles point back weakly so an undeactivated
/// stage still frees its callbacks when dropped.
type Pending = Arc<Mutex<Vec<(u64, EndSlot)>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Idempotent end callback of one scheduled piece.
#[derive(Clone)]
pub struct EndHandle {
    id: u64,
    end: EndSlot,
    pending: Weak<Mutex<Vec<(u64, EndSlot)>>>,
}

impl EndHandle {
    fn noop() -> Self {
        Self {
            id: u64::MAX,
            end: Arc::new(Mutex::new(None)),
            pending: Weak::new(),
        }
    }

    /// Run the end callback. Later calls do nothing.
    pub fn end(&self) {
        let end = lock(&self.end).take();
        if let Some(end) = end {
            if let Some(pending) = self.pending.upgrade() {
                lock(&pending).retain(|(id, _)| *id != self.id);
            }
            end();
        }
    }

    pub fn is_ended(&self) -> bool {
        lock(&self.end).is_none()
    }
}

/// A stage between activation and deactivation.
pub struct ActiveStage {
    deactivate: Mutex<Option<DeactivateFn>>,
    schedule: Mutex<ScheduleFn>,
    pending: Pending,
    next_id: AtomicU64,
    deactivated: AtomicBool,
}

impl ActiveStage {
    pub fn new(
        deactivate: impl FnOnce() + Send + 'static,
        schedule: impl FnMut() -> Option<EndFn> + Send + 'static,
    ) -> Self {
        Self {
            deactivate: Mutex::new(Some(Box::new(deactivate))),
            schedule: Mutex::new(Box::new(schedule)),
            pending: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
            deactivated: AtomicBool::new(false),
        }
    }

    /// Start a piece. Rescheduling while an earlier piece has not ended is
    /// allowed but logged.
    pub fn schedule(&self) -> Result<EndHandle, StageError> {
        if self.is_deactivated() {
            return Err(StageError::Deactivated);
        }
        if !lock(&self.pending).is_empty() {
            log::warn!("rescheduling a piece that wasn't ended");
        }

        let end = (lock(&self.schedule))();
        let Some(end) = end else {
            return Ok(EndHandle::noop());
        };
        let handle = EndHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            end: Arc::new(Mutex::new(Some(end))),
            pending: Arc::downgrade(&self.pending),
        };
        lock(&self.pending).push((handle.id, handle.end.clone()));
        Ok(handle)
    }

    /// End every running piece, then tear the stage down. Later calls do nothing.
    pub fn deactivate(&self) {
        if self.deactivated.swap(true, Ordering::SeqCst) {
            return;
        }
        let running: Vec<EndSlot> = lock(&self.pending).drain(..).map(|(_, slot)| slot).collect();
        for slot in running {
            let end = lock(&slot).take();
            if let Some(end) = end {
                end();
            }
        }
        let deactivate = lock(&self.deactivate).take();
        if let Some(deactivate) = deactivate {
            deactivate();
        }
    }

    pub fn is_deactivated(&self) -> bool {
        self.deactivated.load(Ordering::SeqCst)
    }

    /// Pieces scheduled and not yet ended.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

/// Turn an activation function returning `(deactivate, schedule)` into one
/// returning an [`ActiveStage`].
pub fn wrap_activate<O, E, A>(activate: A) -> impl Fn(O) -> Result<ActiveStage, E>
where
    A: Fn(O) -> Result<(DeactivateFn, ScheduleFn), E>,
{
    move |options| {
        let (deactivate, schedule) = activate(options)?;
        Ok(ActiveStage::new(deactivate, schedule))
    }
}
