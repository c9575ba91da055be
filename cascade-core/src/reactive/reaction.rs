//! Reaction Coordinator
//!
//! A reaction is one transaction over the graph: every force issued while it
//! is open contributes to its dirty set and callback queue, and the reaction
//! settles them in rounds before the opening call returns.
//!
//! # Settle Loop
//!
//! While cells are dirty or callbacks are queued:
//!
//! 1. Plan the round with the [`Scheduler`]: dirty cells plus their transitive
//!    dependants, dependencies first
//! 2. Claim the planned cells, clear the dirty set, take the callback queue.
//!    Dirty cells are claimed `Dirty`, their dependants `MaybeDirty`
//! 3. Walk the plan in order. A `Dirty` cell recalculates; a `MaybeDirty` one
//!    is released untouched, since none of its inputs changed
//! 4. Dispatch the callbacks taken in step 2
//!
//! A cell stays claimed until its turn comes. Marking a claimed cell dirty
//! upgrades it to `Dirty` in the running round instead of deferring it, so a
//! change flowing down the plan recomputes each cell below it once. Forces
//! that hit cells already released land in the next round.
//!
//! The loop gives up after `max_rounds` rounds and reports what was left, which
//! catches cycles and values that oscillate forever.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use crate::error::{CascadeError, ReactionReport, Result};
use crate::graph::{CellId, DirtyState, Scheduler};

use super::context::Scope;
use super::listener::PendingCallback;
use super::runtime::Runtime;

/// State of one open reaction.
#[derive(Debug, Default)]
pub(crate) struct Reaction {
    dirty: IndexSet<CellId>,
    claimed: IndexMap<CellId, DirtyState>,
    pending: Vec<PendingCallback>,
    rounds: usize,
}

impl Reaction {
    /// Mark a cell dirty.
    ///
    /// A cell still waiting in the running round is confirmed there; any
    /// other cell is scheduled for the next round. Returns `true` if it was
    /// newly added to the next round.
    pub fn mark_dirty(&mut self, id: CellId) -> bool {
        if let Some(state) = self.claimed.get_mut(&id) {
            trace!(cell = %id, "planned cell confirmed dirty");
            *state = DirtyState::Dirty;
            return false;
        }
        self.dirty.insert(id)
    }

    pub fn queue(&mut self, callbacks: impl IntoIterator<Item = PendingCallback>) {
        self.pending.extend(callbacks);
    }

    pub fn is_quiescent(&self) -> bool {
        self.dirty.is_empty() && self.pending.is_empty()
    }

    /// Start a round over `order`. Returns the callbacks this round dispatches.
    fn begin_round(&mut self, order: &[CellId]) -> Vec<PendingCallback> {
        self.rounds += 1;
        let claimed = order
            .iter()
            .map(|id| {
                let state = if self.dirty.contains(id) {
                    DirtyState::Dirty
                } else {
                    DirtyState::MaybeDirty
                };
                (*id, state)
            })
            .collect();
        self.claimed = claimed;
        self.dirty.clear();
        std::mem::take(&mut self.pending)
    }

    /// Take a cell's turn. Returns `true` if it must recalculate.
    fn release(&mut self, id: CellId) -> bool {
        matches!(self.claimed.shift_remove(&id), Some(DirtyState::Dirty))
    }

    fn report(&self) -> ReactionReport {
        ReactionReport {
            dirty: self.dirty.iter().copied().collect(),
            pending: self
                .pending
                .iter()
                .map(|callback| (callback.cell, format!("{:?}", callback.value)))
                .collect(),
        }
    }
}

impl Runtime {
    /// Run `f` inside a fresh reaction and settle it.
    ///
    /// Public entry points cannot be reached while a reaction is open (they
    /// need `&mut Runtime`, which the open reaction's scope holds), so a
    /// reaction found here was abandoned by a panicking thunk or listener.
    pub(super) fn react<R>(&mut self, f: impl FnOnce(&mut Runtime) -> Result<R>) -> Result<R> {
        if let Some(stale) = self.reaction.replace(Reaction::default()) {
            warn!(
                dirty = stale.dirty.len(),
                pending = stale.pending.len(),
                "discarding reaction abandoned by a panic"
            );
        }
        debug!("reaction opened");

        let outcome = f(self).and_then(|value| self.settle().map(|()| value));

        if let Some(reaction) = self.reaction.take() {
            if outcome.is_err() {
                debug!(
                    dirty = reaction.dirty.len(),
                    pending = reaction.pending.len(),
                    "reaction discarded after failure"
                );
            }
        }
        outcome
    }

    /// Drive the open reaction until it is quiescent.
    fn settle(&mut self) -> Result<()> {
        let max_rounds = self.config.max_rounds;

        loop {
            let (order, callbacks) = {
                let Some(reaction) = self.reaction.as_mut() else {
                    return Ok(());
                };
                if reaction.is_quiescent() {
                    debug!(rounds = reaction.rounds, "reaction settled");
                    return Ok(());
                }
                if reaction.rounds >= max_rounds {
                    let report = reaction.report();
                    warn!(rounds = reaction.rounds, %report, "reaction did not converge");
                    return Err(CascadeError::NonConvergence {
                        rounds: reaction.rounds,
                        report,
                    });
                }

                let order = Scheduler::new(&self.nodes).plan(&reaction.dirty);
                let callbacks = reaction.begin_round(&order);
                trace!(
                    round = reaction.rounds,
                    cells = order.len(),
                    callbacks = callbacks.len(),
                    "round started"
                );
                (order, callbacks)
            };

            for id in order {
                let stale = self
                    .reaction
                    .as_mut()
                    .is_some_and(|reaction| reaction.release(id));
                if stale {
                    self.recalculate(id)?;
                } else {
                    trace!(cell = %id, "skipped: no input changed");
                }
            }

            self.dispatch(callbacks);
        }
    }

    /// Fire queued callbacks in order.
    ///
    /// Each callback is taken out of its slot while it runs and gets a scope
    /// with no defining cell, so its forces join this reaction.
    fn dispatch(&mut self, callbacks: Vec<PendingCallback>) {
        for PendingCallback {
            cell,
            listener,
            value,
        } in callbacks
        {
            let Some(mut callback) = self.nodes[cell.index()].listeners.take(listener) else {
                trace!(%cell, ?listener, "listener removed before dispatch");
                continue;
            };
            {
                let mut scope = Scope::new(self, None);
                callback(&mut scope, &*value);
            }
            self.nodes[cell.index()].listeners.restore(listener, callback);
            trace!(%cell, ?listener, "listener notified");
        }
    }
}
