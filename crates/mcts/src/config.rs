//! Search configuration parameters.
//!
//! Everything is fixed when the agent is built; nothing here changes during
//! a search.

use iquct_core::{IquctError, Result};
use serde::{Deserialize, Serialize};

/// IQ-UCT configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IqUctConfig {
    /// Discount factor applied to future rewards, in (0, 1].
    pub gamma: f64,

    /// Number of rollouts per call to `act`.
    pub rollouts: usize,

    /// Depth at which a default-policy rollout is cut off.
    pub max_depth: usize,

    /// Exploration constant C of the UCB score.
    /// UCB(a) = inferred_value(a) + C * sqrt(ln(N_parent) / N(a))
    ///
    /// C should be on the scale of the returns: with returns spanning a
    /// range much wider than C, an action that starts with a few poor
    /// samples may never be revisited.
    pub ucb_constant: f64,

    /// Forwarded to every `Environment::transition` call.
    /// `false` plans against a frozen snapshot of the environment model.
    pub dynamic_model: bool,
}

impl Default for IqUctConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            rollouts: 100,
            max_depth: 1000,
            ucb_constant: std::f64::consts::SQRT_2,
            dynamic_model: false,
        }
    }
}

impl IqUctConfig {
    /// Create a new config with the specified number of rollouts.
    pub fn with_rollouts(rollouts: usize) -> Self {
        Self {
            rollouts,
            ..Default::default()
        }
    }

    /// Check that every parameter is in its valid range.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(IquctError::InvalidConfig(format!(
                "gamma {} is not in (0, 1]",
                self.gamma
            )));
        }
        if self.rollouts == 0 {
            return Err(IquctError::InvalidConfig(
                "rollouts must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(IquctError::InvalidConfig(
                "max_depth must be positive".to_string(),
            ));
        }
        if !(self.ucb_constant >= 0.0 && self.ucb_constant.is_finite()) {
            return Err(IquctError::InvalidConfig(format!(
                "ucb_constant {} must be a non-negative real",
                self.ucb_constant
            )));
        }
        Ok(())
    }
}
