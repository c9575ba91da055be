//! Error types for the cascade runtime.

use std::fmt;

use thiserror::Error;

use crate::graph::CellId;

/// Boxed error returned by fallible thunks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum CascadeError {
    /// The settle loop hit its round limit with work still outstanding.
    #[error("reaction did not converge after {rounds} rounds: {report}")]
    NonConvergence { rounds: usize, report: ReactionReport },

    /// A recompute function failed while evaluating `cell`.
    #[error("thunk for cell {cell} failed: {source}")]
    Thunk {
        cell: CellId,
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CascadeError>;

/// Snapshot of a reaction that failed to settle.
///
/// Values are rendered through `Debug` so the report stays independent of the
/// cell value types involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionReport {
    /// Cells still waiting for recalculation.
    pub dirty: Vec<CellId>,
    /// Callbacks queued but never dispatched, as `(cell, rendered value)`.
    pub pending: Vec<(CellId, String)>,
}

impl fmt::Display for ReactionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dirty=[")?;
        for (i, cell) in self.dirty.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "] pending=[")?;
        for (i, (cell, value)) in self.pending.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}={value}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_dirty_and_pending() {
        let report = ReactionReport {
            dirty: vec![CellId::from(1), CellId::from(4)],
            pending: vec![(CellId::from(2), "7".to_string())],
        };
        assert_eq!(report.to_string(), "dirty=[#1, #4] pending=[#2=7]");
    }

    #[test]
    fn non_convergence_message_carries_report() {
        let err = CascadeError::NonConvergence {
            rounds: 10,
            report: ReactionReport {
                dirty: vec![CellId::from(0)],
                pending: Vec::new(),
            },
        };
        assert_eq!(
            err.to_string(),
            "reaction did not converge after 10 rounds: dirty=[#0] pending=[]"
        );
    }
}
