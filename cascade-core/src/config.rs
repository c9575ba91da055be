//! Runtime configuration.
//!
//! The defaults reproduce the engine's documented behaviour: ten settle
//! rounds before a reaction is declared non-convergent, and dependency edges
//! rebuilt from scratch on every recalculation.

use serde::Deserialize;

use crate::error::{CascadeError, Result};

/// Default cap on settle rounds per reaction.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Tunables for a [`Runtime`](crate::reactive::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Rounds a reaction may run before failing with
    /// [`CascadeError::NonConvergence`].
    pub max_rounds: usize,

    /// Drop a cell's previous dependency edges before each recalculation so
    /// only the latest read set triggers it. When disabled, edges accumulate
    /// across evaluations.
    pub prune_stale_edges: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            prune_stale_edges: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_prune_stale_edges(mut self, prune: bool) -> Self {
        self.prune_stale_edges = prune;
        self
    }

    /// Reject settings the settle loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(CascadeError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
