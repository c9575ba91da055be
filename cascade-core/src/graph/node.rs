//! Graph Nodes
//!
//! This module defines the arena slots that back every cell, together with the
//! type-erased value storage the slots use.

use std::any::Any;
use std::fmt;

use indexmap::IndexSet;

use crate::reactive::{ListenerList, Thunk};

/// Unique identifier for a cell: its index in the runtime's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(usize);

impl CellId {
    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for CellId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf cell. It has no recompute function and changes only when
    /// forced from outside.
    Leaf,

    /// A computed cell. Its value is the last result of its thunk.
    Computed,
}

/// Dirty state of a cell planned for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirtyState {
    /// Downstream of a dirty cell. Recomputes only if some input turns out
    /// to have changed by the time its turn comes.
    MaybeDirty,

    /// An input changed; the cell must recompute.
    Dirty,
}

/// Values a cell can hold.
///
/// Equality decides whether a force is a change; `Debug` renders values in
/// diagnostics.
pub trait CellValue: Any + Clone + PartialEq + fmt::Debug + Send {}

impl<T> CellValue for T where T: Any + Clone + PartialEq + fmt::Debug + Send {}

/// Object-safe view of a [`CellValue`].
pub(crate) trait AnyValue: Send + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn AnyValue) -> bool;
    fn clone_value(&self) -> Box<dyn AnyValue>;
}

impl<T: CellValue> AnyValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn AnyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn clone_value(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }
}

/// An arena slot in the dependency graph.
pub(crate) struct Node {
    id: CellId,
    kind: NodeKind,

    /// Current value. `None` only while the first evaluation is running or
    /// after it failed.
    value: Option<Box<dyn AnyValue>>,

    /// Recompute function. Taken out of the slot while it runs.
    pub(crate) thunk: Option<Thunk>,

    /// Cells this node read during its evaluations.
    dependencies: IndexSet<CellId>,

    /// Cells that read this node.
    dependants: IndexSet<CellId>,

    pub(crate) listeners: ListenerList,
}

impl Node {
    pub fn leaf(id: CellId, value: Box<dyn AnyValue>) -> Self {
        Self {
            id,
            kind: NodeKind::Leaf,
            value: Some(value),
            thunk: None,
            dependencies: IndexSet::new(),
            dependants: IndexSet::new(),
            listeners: ListenerList::default(),
        }
    }

    pub fn computed(id: CellId, thunk: Thunk) -> Self {
        Self {
            id,
            kind: NodeKind::Computed,
            value: None,
            thunk: Some(thunk),
            dependencies: IndexSet::new(),
            dependants: IndexSet::new(),
            listeners: ListenerList::default(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value(&self) -> Option<&dyn AnyValue> {
        self.value.as_deref()
    }

    /// Borrow the value as its concrete type.
    ///
    /// Panics if the node has no value yet or holds a different type; both
    /// mean a handle was used against the wrong cell.
    pub fn value_as<T: CellValue>(&self) -> &T {
        self.value
            .as_deref()
            .unwrap_or_else(|| panic!("cell {} read before its first evaluation finished", self.id))
            .as_any()
            .downcast_ref::<T>()
            .unwrap_or_else(|| panic!("cell {} holds a different value type", self.id))
    }

    pub fn set_value(&mut self, value: Box<dyn AnyValue>) {
        self.value = Some(value);
    }

    /// Add a dependant. Returns `true` if the edge is new.
    pub fn add_dependant(&mut self, node_id: CellId) -> bool {
        self.dependants.insert(node_id)
    }

    pub fn remove_dependant(&mut self, node_id: CellId) {
        self.dependants.shift_remove(&node_id);
    }

    pub fn dependants(&self) -> &IndexSet<CellId> {
        &self.dependants
    }

    pub fn add_dependency(&mut self, node_id: CellId) -> bool {
        self.dependencies.insert(node_id)
    }

    pub fn dependencies(&self) -> &IndexSet<CellId> {
        &self.dependencies
    }

    /// Remove and return every dependency edge of this node.
    pub fn take_dependencies(&mut self) -> IndexSet<CellId> {
        std::mem::take(&mut self.dependencies)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("dependencies", &self.dependencies)
            .field("dependants", &self.dependants)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
