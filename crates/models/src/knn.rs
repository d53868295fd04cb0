//! Per-action k-nearest-neighbour regression.

use crate::linear::check_dim;
use iquct_core::{Action, IquctError, Result};
use iquct_mcts::{TrainingExample, ValueModel};
use ndarray::{Array1, ArrayView1};
use std::collections::VecDeque;
use tracing::debug;

/// Stored examples of one action.
#[derive(Clone, Debug, Default)]
struct Memory {
    points: VecDeque<(Array1<f64>, f64)>,
}

/// Predicts the mean target of the `k` stored examples closest to the query.
///
/// Examples are kept per action. With a capacity set, each action keeps
/// only its most recent examples. Untrained actions predict the last
/// feature, as [`LinearModel`](crate::LinearModel) does.
#[derive(Clone, Debug)]
pub struct KnnModel {
    k: usize,
    capacity: Option<usize>,
    dim: Option<usize>,
    memories: Vec<(Action, Memory)>,
}

impl KnnModel {
    /// Create a model averaging over `k` neighbours with unbounded memory.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `k` is zero.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(IquctError::InvalidConfig(
                "k must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            k,
            capacity: None,
            dim: None,
            memories: Vec::new(),
        })
    }

    /// Keep at most `capacity` examples per action, dropping the oldest.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `capacity` is zero.
    pub fn with_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IquctError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        self.capacity = Some(capacity);
        Ok(self)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of examples stored for `action`.
    pub fn examples(&self, action: &Action) -> usize {
        self.memory(action).map_or(0, |m| m.points.len())
    }

    fn memory(&self, action: &Action) -> Option<&Memory> {
        self.memories
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, m)| m)
    }

    fn check_dim(&self, features: &[f64]) -> Result<()> {
        match self.dim {
            Some(dim) => check_dim(dim, features),
            None => Ok(()),
        }
    }
}

impl Default for KnnModel {
    fn default() -> Self {
        Self {
            k: 5,
            capacity: None,
            dim: None,
            memories: Vec::new(),
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let diff = &a - &b;
    diff.dot(&diff)
}

impl ValueModel for KnnModel {
    fn prediction_at(&self, action: &Action, features: &[f64]) -> Result<f64> {
        self.check_dim(features)?;
        let memory = match self.memory(action) {
            Some(m) if !m.points.is_empty() => m,
            _ => return Ok(features.last().copied().unwrap_or(0.0)),
        };

        let query = ArrayView1::from(features);
        let mut scored: Vec<(f64, f64)> = memory
            .points
            .iter()
            .map(|(x, y)| (squared_distance(x.view(), query), *y))
            .collect();

        // Stable sort keeps older examples first among equal distances
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let k = self.k.min(scored.len());
        let sum: f64 = scored[..k].iter().map(|(_, y)| y).sum();
        Ok(sum / k as f64)
    }

    fn update(&mut self, batch: &[TrainingExample]) -> Result<()> {
        let Some(first) = batch.first() else {
            return Ok(());
        };
        // The whole batch is checked before anything is stored
        let dim = self.dim.unwrap_or(first.features.len());
        for example in batch {
            check_dim(dim, &example.features)?;
        }
        self.dim = Some(dim);

        for example in batch {
            let index = match self.memories.iter().position(|(a, _)| *a == example.action) {
                Some(i) => i,
                None => {
                    self.memories
                        .push((example.action.clone(), Memory::default()));
                    self.memories.len() - 1
                }
            };

            let memory = &mut self.memories[index].1;
            memory
                .points
                .push_back((Array1::from(example.features.clone()), example.target));
            if let Some(capacity) = self.capacity {
                while memory.points.len() > capacity {
                    memory.points.pop_front();
                }
            }
        }

        debug!(
            examples = batch.len(),
            actions = self.memories.len(),
            "knn model stored examples"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.dim = None;
        self.memories.clear();
    }
}
