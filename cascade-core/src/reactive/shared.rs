//! Cross-thread access to one runtime.
//!
//! The engine itself has no internal synchronization. [`SharedRuntime`] puts
//! the whole graph behind a single mutex, so a reaction always runs to
//! settlement under the lock and two threads never interleave rounds.
//!
//! Thunks and listeners run while that lock is held. They must reach the
//! graph through the [`Scope`] they are handed (see
//! [`subscribe_with`](SharedRuntime::subscribe_with)); calling back into a
//! clone of the same `SharedRuntime` would deadlock, as the mutex is not
//! reentrant.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;
use crate::graph::CellValue;

use super::cell::Cell;
use super::context::Scope;
use super::listener::ListenerId;
use super::runtime::Runtime;

#[derive(Clone, Default)]
pub struct SharedRuntime {
    inner: Arc<Mutex<Runtime>>,
}

impl SharedRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(runtime)),
        }
    }

    /// Lock the runtime for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Runtime> {
        self.inner.lock()
    }

    pub fn read<T: CellValue>(&self, cell: Cell<T>) -> T {
        self.inner.lock().read(cell)
    }

    pub fn force<T: CellValue>(&self, cell: Cell<T>, value: T) -> Result<()> {
        self.inner.lock().force(cell, value)
    }

    pub fn batch<R>(&self, f: impl FnOnce(&mut Scope<'_>) -> R) -> Result<R> {
        self.inner.lock().batch(f)
    }

    /// Register a listener that reads and forces cells through its scope.
    pub fn subscribe_with<T, F>(&self, cell: Cell<T>, callback: F) -> Result<ListenerId>
    where
        T: CellValue,
        F: FnMut(&mut Scope<'_>, &T) + Send + 'static,
    {
        self.inner.lock().subscribe_with(cell, callback)
    }
}

impl std::fmt::Debug for SharedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRuntime")
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn forces_from_many_threads_all_settle() {
        let shared = SharedRuntime::default();
        let (counter, doubled) = {
            let mut rt = shared.lock();
            let counter = rt.leaf(0_u64);
            let doubled = rt.create(move |s| s.read(counter) * 2).unwrap();
            (counter, doubled)
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        shared
                            .batch(|s| {
                                let next = s.read(counter) + 1;
                                s.force(counter, next);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.read(counter), 400);
        assert_eq!(shared.read(doubled), 800);
    }

    #[test]
    fn listener_reaches_graph_without_relocking() {
        let shared = SharedRuntime::default();
        let (trigger, offset, mirror) = {
            let mut rt = shared.lock();
            (rt.leaf(0_i32), rt.leaf(100_i32), rt.leaf(0_i32))
        };

        shared
            .subscribe_with(trigger, move |s: &mut Scope<'_>, value: &i32| {
                let next = s.read(offset) + value;
                s.force(mirror, next);
            })
            .unwrap();
        assert_eq!(shared.read(mirror), 100);

        let worker = {
            let shared = shared.clone();
            thread::spawn(move || shared.force(trigger, 5))
        };
        worker.join().unwrap().unwrap();

        assert_eq!(shared.read(mirror), 105);
        assert!(!shared.lock().is_reacting());
    }
}
