//! Listener registry.
//!
//! Each cell keeps an ordered list of callbacks. They fire once when
//! registered and afterwards only from the end-of-round dispatch of a
//! reaction, so they never observe a value that is still settling.
//!
//! Every callback receives a [`Scope`] with no defining cell. Plain
//! listeners ignore it; scoped ones use it to read and force cells, and
//! their forces join the reaction being dispatched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::{AnyValue, CellId, CellValue};

use super::context::Scope;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type Callback = Box<dyn FnMut(&mut Scope<'_>, &dyn AnyValue) + Send>;

/// Erase a typed callback that only looks at the value.
pub(crate) fn erase<T, F>(mut callback: F) -> Callback
where
    T: CellValue,
    F: FnMut(&T) + Send + 'static,
{
    Box::new(move |_: &mut Scope<'_>, value: &dyn AnyValue| {
        if let Some(value) = value.as_any().downcast_ref::<T>() {
            callback(value);
        }
    })
}

/// Erase a typed callback that reaches the graph through its scope.
pub(crate) fn erase_scoped<T, F>(mut callback: F) -> Callback
where
    T: CellValue,
    F: FnMut(&mut Scope<'_>, &T) + Send + 'static,
{
    Box::new(move |scope: &mut Scope<'_>, value: &dyn AnyValue| {
        if let Some(value) = value.as_any().downcast_ref::<T>() {
            callback(scope, value);
        }
    })
}

struct Listener {
    id: ListenerId,
    /// `None` while the callback is running.
    callback: Option<Callback>,
}

/// Ordered callbacks of one cell.
#[derive(Default)]
pub(crate) struct ListenerList {
    entries: Vec<Listener>,
}

impl ListenerList {
    pub fn push(&mut self, id: ListenerId, callback: Callback) {
        self.entries.push(Listener {
            id,
            callback: Some(callback),
        });
    }

    /// Remove a listener. Returns `false` if it was not registered here.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|listener| listener.id != id);
        self.entries.len() != before
    }

    pub fn ids(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.entries.iter().map(|listener| listener.id)
    }

    /// Take a callback out to run it. Returns `None` if the listener is no
    /// longer registered or is already running.
    pub fn take(&mut self, id: ListenerId) -> Option<Callback> {
        self.entries
            .iter_mut()
            .find(|listener| listener.id == id)
            .and_then(|listener| listener.callback.take())
    }

    /// Put a callback back after it ran. Dropped if the listener was removed
    /// in the meantime.
    pub fn restore(&mut self, id: ListenerId, callback: Callback) {
        if let Some(listener) = self.entries.iter_mut().find(|listener| listener.id == id) {
            listener.callback = Some(callback);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A callback waiting for the end-of-round dispatch.
pub(crate) struct PendingCallback {
    pub cell: CellId,
    pub listener: ListenerId,
    pub value: Box<dyn AnyValue>,
}

impl fmt::Debug for PendingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallback")
            .field("cell", &self.cell)
            .field("listener", &self.listener)
            .field("value", &self.value)
            .finish()
    }
}
