//! Value model abstraction for the search.
//!
//! The `ValueModel` trait is the seam between tree search and whatever
//! regressor generalizes value estimates across (state, depth, value)
//! features. The search only reads predictions while rolling out and feeds
//! the model one training batch after every search.

use iquct_core::{Action, Result};
use serde::{Deserialize, Serialize};

/// One supervised example extracted from a finished search tree.
///
/// `features` is `[state features..., depth, value]` where `(depth, value)`
/// is a past observation of the same (state, action) pair and `target` is the
/// pair's empirical value in the current tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub action: Action,
    pub features: Vec<f64>,
    pub target: f64,
}

/// Build the model input for a chance node: the state's features followed by
/// a depth and a value.
pub fn feature_vector(state_features: &[f64], depth: usize, value: f64) -> Vec<f64> {
    let mut x = Vec::with_capacity(state_features.len() + 2);
    x.extend_from_slice(state_features);
    x.push(depth as f64);
    x.push(value);
    x
}

/// Trait for predicting chance-node values from features.
///
/// Implementations are keyed by action: the search never asks for a
/// prediction across actions.
pub trait ValueModel {
    /// Predict the value of taking `action` given `features`.
    fn prediction_at(&self, action: &Action, features: &[f64]) -> Result<f64>;

    /// Train on a batch of examples. Never called with an empty batch.
    fn update(&mut self, batch: &[TrainingExample]) -> Result<()>;

    /// Forget everything learned so far.
    fn reset(&mut self);
}

impl<M: ValueModel + ?Sized> ValueModel for Box<M> {
    fn prediction_at(&self, action: &Action, features: &[f64]) -> Result<f64> {
        (**self).prediction_at(action, features)
    }

    fn update(&mut self, batch: &[TrainingExample]) -> Result<()> {
        (**self).update(batch)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Model that echoes the empirical value it is given.
///
/// With it the search reduces to plain UCT: the inferred value of every
/// chance node is its own mean return.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmpiricalModel;

impl ValueModel for EmpiricalModel {
    fn prediction_at(&self, _action: &Action, features: &[f64]) -> Result<f64> {
        Ok(features.last().copied().unwrap_or(0.0))
    }

    fn update(&mut self, _batch: &[TrainingExample]) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) {}
}
