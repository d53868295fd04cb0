//! Per-action ridge regression.
//!
//! Each action gets its own linear model over `[features..., 1]`. The
//! normal equations are accumulated across every batch ever seen, so a
//! refit after `update` is the exact ridge solution on all data so far
//! rather than a step of online gradient descent.

use crate::linalg;
use iquct_core::{Action, IquctError, Result};
use iquct_mcts::{TrainingExample, ValueModel};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Accumulated normal equations and current weights of one action.
#[derive(Clone, Debug)]
struct RidgeFit {
    xtx: Array2<f64>,
    xty: Array1<f64>,
    examples: usize,
    weights: Array1<f64>,
}

impl RidgeFit {
    fn new(dim: usize) -> Self {
        Self {
            xtx: Array2::zeros((dim, dim)),
            xty: Array1::zeros(dim),
            examples: 0,
            weights: Array1::zeros(dim),
        }
    }

    fn accumulate(&mut self, x: &Array1<f64>, y: f64) {
        let dim = x.len();
        for i in 0..dim {
            for j in 0..dim {
                self.xtx[[i, j]] += x[i] * x[j];
            }
            self.xty[i] += x[i] * y;
        }
        self.examples += 1;
    }

    fn refit(&mut self, lambda: f64) -> Result<()> {
        let mut a = self.xtx.clone();
        for i in 0..a.nrows() {
            a[[i, i]] += lambda;
        }
        self.weights = linalg::solve(a, self.xty.clone())
            .ok_or_else(|| IquctError::Model("ridge normal equations are singular".to_string()))?;
        Ok(())
    }
}

/// Ridge regression with one weight vector per action.
///
/// Actions the model has never been trained on predict the last feature,
/// which for search inputs is the node's empirical value.
#[derive(Clone, Debug)]
pub struct LinearModel {
    lambda: f64,
    dim: Option<usize>,
    fits: Vec<(Action, RidgeFit)>,
}

impl LinearModel {
    /// Create a model with L2 penalty `lambda`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `lambda` is not a positive real.
    pub fn new(lambda: f64) -> Result<Self> {
        if !(lambda > 0.0 && lambda.is_finite()) {
            return Err(IquctError::InvalidConfig(format!(
                "ridge penalty {} must be a positive real",
                lambda
            )));
        }
        Ok(Self {
            lambda,
            dim: None,
            fits: Vec::new(),
        })
    }

    /// Number of examples seen for `action`.
    pub fn examples(&self, action: &Action) -> usize {
        self.fit(action).map_or(0, |f| f.examples)
    }

    /// Current weights for `action`, bias last.
    pub fn weights(&self, action: &Action) -> Option<&Array1<f64>> {
        self.fit(action).map(|f| &f.weights)
    }

    fn fit(&self, action: &Action) -> Option<&RidgeFit> {
        self.fits.iter().find(|(a, _)| a == action).map(|(_, f)| f)
    }

    fn check_dim(&self, features: &[f64]) -> Result<()> {
        match self.dim {
            Some(dim) => check_dim(dim, features),
            None => Ok(()),
        }
    }
}

impl Default for LinearModel {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            dim: None,
            fits: Vec::new(),
        }
    }
}

pub(crate) fn check_dim(dim: usize, features: &[f64]) -> Result<()> {
    if features.len() == dim {
        Ok(())
    } else {
        Err(IquctError::Model(format!(
            "expected {} features, got {}",
            dim,
            features.len()
        )))
    }
}

fn with_bias(features: &[f64]) -> Array1<f64> {
    features.iter().copied().chain(std::iter::once(1.0)).collect()
}

impl ValueModel for LinearModel {
    fn prediction_at(&self, action: &Action, features: &[f64]) -> Result<f64> {
        self.check_dim(features)?;
        match self.fit(action) {
            Some(fit) => Ok(fit.weights.dot(&with_bias(features))),
            None => Ok(features.last().copied().unwrap_or(0.0)),
        }
    }

    fn update(&mut self, batch: &[TrainingExample]) -> Result<()> {
        let Some(first) = batch.first() else {
            return Ok(());
        };
        // The whole batch is checked before anything is accumulated
        let dim = self.dim.unwrap_or(first.features.len());
        for example in batch {
            check_dim(dim, &example.features)?;
        }
        self.dim = Some(dim);

        let mut touched: Vec<usize> = Vec::new();
        for example in batch {
            let index = match self.fits.iter().position(|(a, _)| *a == example.action) {
                Some(i) => i,
                None => {
                    self.fits
                        .push((example.action.clone(), RidgeFit::new(dim + 1)));
                    self.fits.len() - 1
                }
            };
            self.fits[index]
                .1
                .accumulate(&with_bias(&example.features), example.target);
            if !touched.contains(&index) {
                touched.push(index);
            }
        }

        for &index in &touched {
            self.fits[index].1.refit(self.lambda)?;
        }

        debug!(
            examples = batch.len(),
            actions = touched.len(),
            "linear model refitted"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.dim = None;
        self.fits.clear();
    }
}
