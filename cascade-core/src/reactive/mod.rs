//! Reactive Primitives
//!
//! This module implements the cell API and the reaction engine on top of the
//! arena in [`graph`](crate::graph).
//!
//! # Concepts
//!
//! ## Cells
//!
//! A cell holds a value. Leaf cells change only when forced from outside;
//! computed cells own a thunk and change when it produces a different result.
//! Cells are addressed through typed, `Copy` handles ([`Cell<T>`]).
//!
//! ## Scopes
//!
//! Thunks read other cells through a [`Scope`]. Reading through a scope that
//! is defining a cell records a dependency edge, so the graph is discovered
//! by running the code rather than declared up front. Branches are honoured:
//! only the cells a given evaluation actually reads become dependencies.
//!
//! ## Reactions
//!
//! Every force belongs to a reaction. A top-level force opens one; forces
//! issued by thunks, listeners or inside [`Runtime::batch`] join it. A
//! reaction recalculates dirty cells in dependency order, round after round,
//! and dispatches listeners at the end of each round until nothing is left.
//! A cell whose inputs all came out unchanged is not recalculated.
//!
//! ## Listeners
//!
//! [`Runtime::on_change`] registers a callback that fires once immediately and
//! then once per round in which the cell's settled value changed.
//! [`Runtime::subscribe_with`] registers one that also receives a [`Scope`],
//! for listeners that read or force other cells.

mod cell;
mod context;
mod listener;
mod reaction;
mod runtime;
mod shared;

pub use cell::Cell;
pub use context::Scope;
pub use listener::ListenerId;
pub use runtime::Runtime;
pub use shared::SharedRuntime;

pub(crate) use context::Thunk;
pub(crate) use listener::ListenerList;
