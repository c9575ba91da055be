//! Typed cell handles.
//!
//! A [`Cell<T>`] is a lightweight token naming an arena slot of a
//! [`Runtime`](super::Runtime). The value itself lives in the runtime; the
//! handle only carries the slot id and, at compile time, the value type.
//!
//! Handles are `Copy`, so thunks capture them by value without cloning
//! anything heavier than an index.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::graph::CellId;

pub struct Cell<T> {
    id: CellId,
    _value: PhantomData<fn() -> T>,
}

impl<T> Cell<T> {
    pub(crate) fn new(id: CellId) -> Self {
        Self {
            id,
            _value: PhantomData,
        }
    }

    /// Get the cell's arena id.
    pub fn id(&self) -> CellId {
        self.id
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cell<T> {}

impl<T> PartialEq for Cell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Cell<T> {}

impl<T> Hash for Cell<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&self.id).finish()
    }
}
