//! Evaluation Scope
//!
//! A [`Scope`] is the handle every recompute function receives. It carries
//! the cell currently being defined, if any, and records a dependency edge
//! whenever a cell is read through it.
//!
//! # Implementation
//!
//! The "currently defining" marker is a field of the scope rather than
//! thread-local state. Evaluating a cell builds a fresh scope for that cell,
//! so nested definitions (a thunk that creates further cells) restore the
//! outer marker simply by returning to the outer scope.

use crate::error::{BoxError, Result};
use crate::graph::{AnyValue, CellId, CellValue};

use super::cell::Cell;
use super::listener::{self, ListenerId};
use super::runtime::Runtime;

/// Outcome of one thunk evaluation.
pub(crate) type Evaluation = std::result::Result<Box<dyn AnyValue>, BoxError>;

/// A type-erased recompute function.
pub(crate) type Thunk = Box<dyn FnMut(&mut Scope<'_>) -> Evaluation + Send>;

/// Read handle passed to recompute functions and batches.
///
/// A scope only exists while a reaction is open, so forces issued through it
/// join that reaction instead of settling on their own.
pub struct Scope<'rt> {
    runtime: &'rt mut Runtime,
    defining: Option<CellId>,
}

impl<'rt> Scope<'rt> {
    pub(crate) fn new(runtime: &'rt mut Runtime, defining: Option<CellId>) -> Self {
        Self { runtime, defining }
    }

    /// The cell whose evaluation is running, if reads are being tracked.
    pub fn defining(&self) -> Option<CellId> {
        self.defining
    }

    /// Check whether reads through this scope record dependencies.
    pub fn is_tracking(&self) -> bool {
        self.defining.is_some()
    }

    /// Read a cell's current value.
    ///
    /// When this scope is defining a cell, the read cell gains that cell as a
    /// dependant first.
    pub fn read<T: CellValue>(&mut self, cell: Cell<T>) -> T {
        if let Some(defining) = self.defining {
            self.runtime.link(cell.id(), defining);
        }
        self.runtime.read(cell)
    }

    /// Run `f` with dependency discovery switched off.
    ///
    /// Reads inside `f` record no edges, which lets a cell dereference
    /// per-element cells while depending only on their container.
    pub fn untracked<R>(&mut self, f: impl FnOnce(&mut Scope<'_>) -> R) -> R {
        let mut inner = Scope::new(&mut *self.runtime, None);
        f(&mut inner)
    }

    /// Force a cell inside the open reaction.
    ///
    /// The change is settled together with the rest of the reaction.
    /// Returns `true` if the value changed.
    pub fn force<T: CellValue>(&mut self, cell: Cell<T>, value: T) -> bool {
        self.runtime.force_in_reaction(cell.id(), Box::new(value))
    }

    /// Create a leaf cell holding `value`.
    pub fn leaf<T: CellValue>(&mut self, value: T) -> Cell<T> {
        self.runtime.leaf(value)
    }

    /// Create a computed cell from within an evaluation or batch.
    pub fn create<T, F>(&mut self, thunk: F) -> Result<Cell<T>>
    where
        T: CellValue,
        F: FnMut(&mut Scope<'_>) -> T + Send + 'static,
    {
        let id = self.runtime.create_in_reaction(infallible(thunk))?;
        Ok(Cell::new(id))
    }

    pub fn try_create<T, E, F>(&mut self, thunk: F) -> Result<Cell<T>>
    where
        T: CellValue,
        E: Into<BoxError>,
        F: FnMut(&mut Scope<'_>) -> std::result::Result<T, E> + Send + 'static,
    {
        let id = self.runtime.create_in_reaction(fallible(thunk))?;
        Ok(Cell::new(id))
    }

    /// Register a listener; it fires immediately with the current value.
    pub fn on_change<T, F>(&mut self, cell: Cell<T>, callback: F) -> Cell<T>
    where
        T: CellValue,
        F: FnMut(&T) + Send + 'static,
    {
        self.runtime.register(cell.id(), listener::erase(callback));
        cell
    }

    /// Register a listener and return its id for later removal.
    pub fn subscribe<T, F>(&mut self, cell: Cell<T>, callback: F) -> ListenerId
    where
        T: CellValue,
        F: FnMut(&T) + Send + 'static,
    {
        self.runtime.register(cell.id(), listener::erase(callback))
    }

    /// Register a listener that reaches the graph through its own scope.
    pub fn subscribe_with<T, F>(&mut self, cell: Cell<T>, callback: F) -> ListenerId
    where
        T: CellValue,
        F: FnMut(&mut Scope<'_>, &T) + Send + 'static,
    {
        self.runtime.register(cell.id(), listener::erase_scoped(callback))
    }
}

pub(crate) fn infallible<T, F>(mut thunk: F) -> Thunk
where
    T: CellValue,
    F: FnMut(&mut Scope<'_>) -> T + Send + 'static,
{
    Box::new(move |scope: &mut Scope<'_>| -> Evaluation {
        Ok(Box::new(thunk(scope)) as Box<dyn AnyValue>)
    })
}

pub(crate) fn fallible<T, E, F>(mut thunk: F) -> Thunk
where
    T: CellValue,
    E: Into<BoxError>,
    F: FnMut(&mut Scope<'_>) -> std::result::Result<T, E> + Send + 'static,
{
    Box::new(move |scope: &mut Scope<'_>| -> Evaluation {
        match thunk(scope) {
            Ok(value) => Ok(Box::new(value) as Box<dyn AnyValue>),
            Err(err) => Err(err.into()),
        }
    })
}
