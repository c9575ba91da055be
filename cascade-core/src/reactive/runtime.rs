//! Reactive Runtime
//!
//! The runtime owns every cell of one graph and is the entry point for the
//! four cell operations: create, read, force and on-change.
//!
//! # How It Works
//!
//! 1. Creating a computed cell evaluates its thunk once through a [`Scope`]
//!    defining the new cell. Every cell read through that scope gains an edge
//!    to it.
//!
//! 2. Forcing a cell to a different value stores the value, queues its
//!    listeners and marks its dependants dirty in the open reaction.
//!
//! 3. A top-level force, create or batch opens the reaction itself and
//!    settles it before returning (see the `reaction` module).
//!
//! # Thread Safety
//!
//! All state is reached through `&mut Runtime`, so the borrow checker rules
//! out concurrent mutation. Thunks, listeners and values are `Send`; share a
//! runtime between threads through [`SharedRuntime`](super::SharedRuntime).

use tracing::trace;

use crate::config::RuntimeConfig;
use crate::error::{BoxError, CascadeError, Result};
use crate::graph::{AnyValue, CellId, CellValue, Node, NodeKind};

use super::cell::Cell;
use super::context::{fallible, infallible, Scope, Thunk};
use super::listener::{self, Callback, ListenerId, PendingCallback};
use super::reaction::Reaction;

/// Arena of cells plus the state of the reaction currently settling.
pub struct Runtime {
    pub(super) nodes: Vec<Node>,
    pub(super) reaction: Option<Reaction>,
    pub(super) config: RuntimeConfig,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            reaction: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Create a runtime with a validated configuration.
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// The configuration this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of cells ever created in this runtime.
    pub fn cell_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether a reaction is open. Only observable after a panic
    /// unwound out of one.
    pub fn is_reacting(&self) -> bool {
        self.reaction.is_some()
    }

    /// Whether `id` is a leaf or a computed cell.
    pub fn kind(&self, id: CellId) -> NodeKind {
        self.node(id).kind()
    }

    /// Create a leaf cell holding `value`.
    ///
    /// Use an `Option<T>` value type for cells that start out undefined.
    pub fn leaf<T: CellValue>(&mut self, value: T) -> Cell<T> {
        let id = CellId::from(self.nodes.len());
        self.nodes.push(Node::leaf(id, Box::new(value)));
        trace!(cell = %id, "leaf created");
        Cell::new(id)
    }

    /// Create a computed cell.
    ///
    /// The thunk runs once immediately to produce the initial value and to
    /// discover its dependencies. Any forces it issues settle before this
    /// returns.
    pub fn create<T, F>(&mut self, thunk: F) -> Result<Cell<T>>
    where
        T: CellValue,
        F: FnMut(&mut Scope<'_>) -> T + Send + 'static,
    {
        let thunk = infallible(thunk);
        let id = self.react(|rt| rt.create_in_reaction(thunk))?;
        Ok(Cell::new(id))
    }

    /// Create a computed cell whose thunk can fail.
    pub fn try_create<T, E, F>(&mut self, thunk: F) -> Result<Cell<T>>
    where
        T: CellValue,
        E: Into<BoxError>,
        F: FnMut(&mut Scope<'_>) -> std::result::Result<T, E> + Send + 'static,
    {
        let thunk = fallible(thunk);
        let id = self.react(|rt| rt.create_in_reaction(thunk))?;
        Ok(Cell::new(id))
    }

    /// Read a cell's current value. Records no dependency.
    pub fn read<T: CellValue>(&self, cell: Cell<T>) -> T {
        self.node(cell.id()).value_as::<T>().clone()
    }

    /// Force a cell to `value` and settle every consequence.
    ///
    /// Forcing the value a cell already holds does nothing.
    pub fn force<T: CellValue>(&mut self, cell: Cell<T>, value: T) -> Result<()> {
        self.react(|rt| {
            rt.force_in_reaction(cell.id(), Box::new(value));
            Ok(())
        })
    }

    /// Run several operations as one reaction that settles once at the end.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Scope<'_>) -> R) -> Result<R> {
        self.react(|rt| {
            let mut scope = Scope::new(rt, None);
            Ok(f(&mut scope))
        })
    }

    /// Register a listener and call it once with the current value.
    pub fn on_change<T, F>(&mut self, cell: Cell<T>, callback: F) -> Cell<T>
    where
        T: CellValue,
        F: FnMut(&T) + Send + 'static,
    {
        self.register(cell.id(), listener::erase(callback));
        cell
    }

    /// Like [`on_change`](Self::on_change), but returns an id for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<T, F>(&mut self, cell: Cell<T>, callback: F) -> ListenerId
    where
        T: CellValue,
        F: FnMut(&T) + Send + 'static,
    {
        self.register(cell.id(), listener::erase(callback))
    }

    /// Register a listener that can read and force cells.
    ///
    /// The callback gets a [`Scope`] with no defining cell. Its forces join
    /// the reaction that dispatched it; the replay at registration runs in a
    /// reaction of its own, settled before this returns.
    pub fn subscribe_with<T, F>(&mut self, cell: Cell<T>, callback: F) -> Result<ListenerId>
    where
        T: CellValue,
        F: FnMut(&mut Scope<'_>, &T) + Send + 'static,
    {
        let callback = listener::erase_scoped(callback);
        self.react(|rt| Ok(rt.register(cell.id(), callback)))
    }

    /// Remove a listener. Returns `false` if it was not registered on `cell`.
    pub fn unsubscribe<T>(&mut self, cell: Cell<T>, listener: ListenerId) -> bool {
        self.node_mut(cell.id()).listeners.remove(listener)
    }

    /// Cells that read `id` in their recorded evaluations.
    pub fn dependants(&self, id: CellId) -> Vec<CellId> {
        self.node(id).dependants().iter().copied().collect()
    }

    /// Cells `id` read in its recorded evaluations.
    pub fn dependencies(&self, id: CellId) -> Vec<CellId> {
        self.node(id).dependencies().iter().copied().collect()
    }

    fn node(&self, id: CellId) -> &Node {
        self.nodes
            .get(id.index())
            .unwrap_or_else(|| panic!("cell {id} does not belong to this runtime"))
    }

    fn node_mut(&mut self, id: CellId) -> &mut Node {
        self.nodes
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("cell {id} does not belong to this runtime"))
    }

    /// Replay the current value to `callback`, then store it.
    ///
    /// Scoped callbacks must be registered inside a reaction. Plain ones
    /// never touch their scope, so they may be replayed outside one.
    pub(super) fn register(&mut self, id: CellId, mut callback: Callback) -> ListenerId {
        let listener = ListenerId::new();
        if let Some(value) = self.node(id).value().map(|value| value.clone_value()) {
            let mut scope = Scope::new(self, None);
            callback(&mut scope, &*value);
        }
        self.node_mut(id).listeners.push(listener, callback);
        listener
    }

    /// Record that `dependant` read `dependency`.
    ///
    /// A cell reading itself sees its previous value and records no edge.
    pub(super) fn link(&mut self, dependency: CellId, dependant: CellId) {
        if dependency == dependant {
            return;
        }
        if self.node_mut(dependency).add_dependant(dependant) {
            trace!(%dependency, %dependant, "edge discovered");
        }
        self.node_mut(dependant).add_dependency(dependency);
    }

    fn unlink_dependencies(&mut self, id: CellId) {
        let dependencies = self.node_mut(id).take_dependencies();
        for dependency in dependencies {
            self.node_mut(dependency).remove_dependant(id);
        }
    }

    /// Apply a force inside the open reaction. Returns `true` on change.
    pub(super) fn force_in_reaction(&mut self, id: CellId, value: Box<dyn AnyValue>) -> bool {
        let node = self.node_mut(id);
        if node.value().is_some_and(|current| current.eq_value(&*value)) {
            trace!(cell = %id, "force ignored: value unchanged");
            return false;
        }

        let queued: Vec<PendingCallback> = node
            .listeners
            .ids()
            .map(|listener| PendingCallback {
                cell: id,
                listener,
                value: value.clone_value(),
            })
            .collect();
        let dependants: Vec<CellId> = node.dependants().iter().copied().collect();
        trace!(cell = %id, value = ?value, dependants = dependants.len(), "forced");
        node.set_value(value);

        let reaction = self
            .reaction
            .as_mut()
            .expect("cells are only forced inside an open reaction");
        reaction.queue(queued);
        for dependant in dependants {
            reaction.mark_dirty(dependant);
        }
        true
    }

    pub(super) fn create_in_reaction(&mut self, thunk: Thunk) -> Result<CellId> {
        let id = CellId::from(self.nodes.len());
        self.nodes.push(Node::computed(id, thunk));

        match self.evaluate(id) {
            Ok(Some(value)) => {
                self.node_mut(id).set_value(value);
                trace!(cell = %id, "computed cell created");
                Ok(id)
            }
            Ok(None) => Ok(id),
            Err(err) => {
                // Leave an inert slot behind: no thunk, no edges.
                self.unlink_dependencies(id);
                self.node_mut(id).thunk = None;
                Err(err)
            }
        }
    }

    /// Run the cell's thunk through a scope defining the cell.
    ///
    /// Returns `Ok(None)` for cells without a thunk: leaves, and cells whose
    /// thunk is already on the stack.
    fn evaluate(&mut self, id: CellId) -> Result<Option<Box<dyn AnyValue>>> {
        let Some(mut thunk) = self.node_mut(id).thunk.take() else {
            return Ok(None);
        };

        if self.config.prune_stale_edges {
            self.unlink_dependencies(id);
        }

        let outcome = {
            let mut scope = Scope::new(self, Some(id));
            thunk(&mut scope)
        };
        self.node_mut(id).thunk = Some(thunk);

        outcome
            .map(Some)
            .map_err(|source| CascadeError::Thunk { cell: id, source })
    }

    /// Re-evaluate a computed cell and force it to the result.
    pub(super) fn recalculate(&mut self, id: CellId) -> Result<bool> {
        trace!(cell = %id, "recalculating");
        match self.evaluate(id)? {
            Some(value) => Ok(self.force_in_reaction(id, value)),
            None => Ok(false),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("cells", &self.nodes.len())
            .field("reacting", &self.reaction.is_some())
            .field("config", &self.config)
            .finish()
    }
}
