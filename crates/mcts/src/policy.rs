//! Default rollout policies.
//!
//! After expansion the search estimates a leaf by simulating from it with a
//! cheap policy until the episode ends or the depth limit is hit. The
//! `DefaultPolicy` trait allows swapping the uniform sampler for anything
//! that can propose an action for a state, such as a learned or
//! language-model policy.

use iquct_core::{Action, Environment, Result};
use rand::Rng;

/// Trait for choosing actions during default-policy rollouts.
pub trait DefaultPolicy<E: Environment> {
    /// Propose the next action to simulate from `state`.
    fn sample_action(&mut self, env: &E, state: &E::State) -> Result<Action>;
}

/// Policy sampling uniformly from the environment's action space.
///
/// Works for every space kind, including `Box` spaces the search itself
/// cannot enumerate.
pub struct UniformPolicy<R: Rng> {
    rng: R,
}

impl<R: Rng> UniformPolicy<R> {
    /// Create a new uniform policy.
    ///
    /// # Arguments
    /// * `rng` - Random number generator for action sampling
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<E: Environment, R: Rng> DefaultPolicy<E> for UniformPolicy<R> {
    fn sample_action(&mut self, env: &E, _state: &E::State) -> Result<Action> {
        env.action_space().sample(&mut self.rng)
    }
}
