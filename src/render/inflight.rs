//! In-flight builds — at most one running build per name; concurrent callers
//! for the same name share its result.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

enum State<T> {
    Pending,
    Done(T),
    /// The building thread unwound before producing a result.
    Abandoned,
}

struct Slot<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
            ready: Condvar::new(),
        }
    }

    fn finish(&self, state: State<T>) {
        *lock(&self.state) = state;
        self.ready.notify_all();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map from build name to the build currently producing it.
///
/// The entry exists exactly while its build runs and is removed whether the
/// build succeeds or fails, so a later call starts afresh.
pub struct InFlight<T: Clone> {
    slots: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

/// Removes the entry and wakes waiters, even if the build unwinds.
struct Leader<'a, T: Clone> {
    map: &'a InFlight<T>,
    name: &'a str,
    slot: Arc<Slot<T>>,
    result: Option<T>,
}

impl<T: Clone> Drop for Leader<'_, T> {
    fn drop(&mut self) {
        lock(&self.map.slots).remove(self.name);
        match self.result.take() {
            Some(result) => self.slot.finish(State::Done(result)),
            None => self.slot.finish(State::Abandoned),
        }
    }
}

impl<T: Clone> InFlight<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a build for `name` is running.
    pub fn is_building(&self, name: &str) -> bool {
        lock(&self.slots).contains_key(name)
    }

    /// Number of running builds.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the running build for `name`, or run `build` as the leader.
    pub fn run(&self, name: &str, build: impl FnOnce() -> T) -> T {
        self.run_or_cached(name, || None, build)
    }

    /// Like [`run`](Self::run), but the leader first asks `cached` and only
    /// builds when it has nothing.
    ///
    /// `cached` runs after the entry is claimed, so a result stored by a build
    /// that finished just before this call is found rather than rebuilt.
    pub fn run_or_cached(
        &self,
        name: &str,
        cached: impl Fn() -> Option<T>,
        build: impl FnOnce() -> T,
    ) -> T {
        let slot = loop {
            let (slot, leading) = {
                let mut slots = lock(&self.slots);
                match slots.get(name) {
                    Some(slot) => (slot.clone(), false),
                    None => {
                        let slot = Arc::new(Slot::new());
                        slots.insert(name.to_string(), slot.clone());
                        (slot, true)
                    }
                }
            };
            if leading {
                break slot;
            }

            log::debug!("waiting for in-flight build '{name}'");
            let mut state = lock(&slot.state);
            while matches!(*state, State::Pending) {
                state = slot.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
            if let State::Done(result) = &*state {
                return result.clone();
            }
            // The leader unwound; try to take over.
        };

        let mut leader = Leader {
            map: self,
            name,
            slot,
            result: None,
        };
        let result = cached().unwrap_or_else(build);
        leader.result = Some(result.clone());
        result
    }
}

impl<T: Clone> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_caller_builds() {
        let inflight: InFlight<u32> = InFlight::new();
        assert_eq!(inflight.run("a", || 7), 7);
        assert!(inflight.is_empty());
    }

    #[test]
    fn concurrent_callers_share_one_build() {
        let inflight = Arc::new(InFlight::<Result<u32, String>>::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let inflight = inflight.clone();
                let builds = builds.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    inflight.run("piano", || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok(42)
                    })
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| *r == Ok(42)));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(!inflight.is_building("piano"));
    }

    #[test]
    fn failure_reaches_waiters_and_clears_entry() {
        let inflight = Arc::new(InFlight::<Result<u32, String>>::new());
        let started = Arc::new(Barrier::new(2));

        let leader = {
            let inflight = inflight.clone();
            let started = started.clone();
            thread::spawn(move || {
                inflight.run("piano", || {
                    started.wait();
                    thread::sleep(Duration::from_millis(50));
                    Err("boom".to_string())
                })
            })
        };
        started.wait();
        assert!(inflight.is_building("piano"));
        let follower = inflight.run("piano", || Ok(1));

        assert_eq!(leader.join().unwrap(), Err("boom".to_string()));
        assert_eq!(follower, Err("boom".to_string()));
        assert!(inflight.is_empty());
        assert_eq!(inflight.run("piano", || Ok(2)), Ok(2));
    }

    #[test]
    fn cached_result_skips_build() {
        let inflight: InFlight<u32> = InFlight::new();
        let built = AtomicUsize::new(0);
        let value = inflight.run_or_cached(
            "a",
            || Some(3),
            || {
                built.fetch_add(1, Ordering::SeqCst);
                9
            },
        );
        assert_eq!(value, 3);
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn different_names_build_independently() {
        let inflight: InFlight<&'static str> = InFlight::new();
        assert_eq!(inflight.run("a", || "x"), "x");
        assert_eq!(inflight.run("b", || "y"), "y");
    }

    #[test]
    fn panicking_leader_leaves_no_entry() {
        let inflight: InFlight<u32> = InFlight::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            inflight.run("a", || panic!("build failed"));
        }));
        assert!(result.is_err());
        assert!(inflight.is_empty());
        assert_eq!(inflight.run("a", || 5), 5);
    }
}
