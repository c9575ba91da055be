//! Recalculation Scheduler
//!
//! The scheduler decides in which order the dirty cells of a round are
//! recalculated. It ensures that, among the cells scheduled together, every
//! dependency is recalculated before its dependants.
//!
//! # Algorithm
//!
//! 1. Expand the dirty set along dependant edges. The transitive dependants
//!    are "maybe dirty": they take part in the ordering, but the reaction
//!    only recomputes them if an input actually changes during the round
//! 2. Keep only the edges whose endpoints are both in the expanded set
//! 3. Sort the constrained cells with Kahn's algorithm
//! 4. Append cells that have no edge inside the set, in dirty order
//!
//! Edges may be stale when a cell stopped reading a dependency and pruning is
//! disabled, so the order is a heuristic for avoiding redundant work. Results
//! stay correct regardless because every recalculation reads current values.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::warn;

use super::node::{CellId, Node};

/// Computes recalculation orders over the runtime's arena.
pub(crate) struct Scheduler<'a> {
    nodes: &'a [Node],
}

impl<'a> Scheduler<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self { nodes }
    }

    /// Plan one round: every cell that may recalculate, dependencies first.
    pub fn plan(&self, dirty: &IndexSet<CellId>) -> Vec<CellId> {
        let scheduled = self.expand(dirty);
        self.topological_sort(&scheduled)
    }

    /// Close `dirty` over dependant edges.
    fn expand(&self, dirty: &IndexSet<CellId>) -> IndexSet<CellId> {
        let mut scheduled = dirty.clone();
        let mut queue: VecDeque<CellId> = dirty.iter().copied().collect();

        while let Some(node_id) = queue.pop_front() {
            for &dependant in self.nodes[node_id.index()].dependants() {
                if scheduled.insert(dependant) {
                    queue.push_back(dependant);
                }
            }
        }

        scheduled
    }

    /// Order `cells` so dependencies come before dependants.
    fn topological_sort(&self, cells: &IndexSet<CellId>) -> Vec<CellId> {
        let mut in_degree: HashMap<CellId, usize> = HashMap::new();
        let mut successors: HashMap<CellId, SmallVec<[CellId; 4]>> = HashMap::new();

        // Induced sub-graph: only edges with both endpoints scheduled.
        for &node_id in cells {
            for &dependant in self.nodes[node_id.index()].dependants() {
                if dependant == node_id || !cells.contains(&dependant) {
                    continue;
                }
                successors.entry(node_id).or_default().push(dependant);
                *in_degree.entry(dependant).or_default() += 1;
                in_degree.entry(node_id).or_default();
            }
        }

        let mut result = Vec::with_capacity(cells.len());
        let mut queue: VecDeque<CellId> = cells
            .iter()
            .copied()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        // Kahn's algorithm
        while let Some(node_id) = queue.pop_front() {
            result.push(node_id);

            if let Some(next) = successors.get(&node_id) {
                for dependant in next {
                    if let Some(degree) = in_degree.get_mut(dependant) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(*dependant);
                        }
                    }
                }
            }
        }

        let constrained = in_degree.len();
        if result.len() < constrained {
            // A cycle inside the round; run what is left in dirty order.
            let leftover: Vec<CellId> = cells
                .iter()
                .copied()
                .filter(|id| in_degree.get(id).is_some_and(|degree| *degree > 0))
                .collect();
            warn!(cells = ?leftover, "dependency cycle among dirty cells");
            result.extend(leftover);
        }

        result.extend(cells.iter().copied().filter(|id| !in_degree.contains_key(id)));
        result
    }
}
