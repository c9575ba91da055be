//! Dependency Graph
//!
//! This module holds the storage side of the engine: the arena slots that
//! back cells and the scheduler that orders recalculation.
//!
//! # Overview
//!
//! - Nodes are cells. A node is either a leaf (changed only by external
//!   forces) or computed (owns a recompute function)
//! - Edges point from dependency to dependant: if A reads B while A is being
//!   evaluated, there is an edge from B to A
//!
//! Edges are discovered while cells evaluate, so the graph is never declared
//! up front. It may also contain cycles; the scheduler tolerates them and the
//! reaction's round limit catches the ones that never settle.
//!
//! # Design Decisions
//!
//! 1. Nodes live in one arena and refer to each other only by [`CellId`].
//!    There are no owning references between nodes, so the cyclic shape of
//!    the graph never becomes an ownership cycle.
//!
//! 2. Each node stores both directions (dependencies and dependants) so
//!    stale edges can be pruned without scanning the arena.

mod node;
mod scheduler;

pub use node::{CellId, CellValue, NodeKind};
pub(crate) use node::{AnyValue, DirtyState, Node};
pub(crate) use scheduler::Scheduler;
