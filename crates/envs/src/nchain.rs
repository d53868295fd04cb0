//! N-chain environment.
//!
//! A row of `n` positions. Moving forward pays nothing until the last
//! position, where staying pays a large reward; moving backward returns to
//! the start with a small reward. With probability `slip` the chosen action
//! is swapped, so the same (state, action) pair has two possible outcomes.
//!
//! ```text
//!  start                         end
//!  [0] -> [1] -> [2] -> [3] -> [4] (+10 while pushing forward)
//!   ^------------------------------ backward (+2)
//! ```
//!
//! Planning easily settles on the small backward reward; reaching the far
//! end requires looking several steps ahead.

use iquct_core::{Action, ActionSpace, Environment, IquctError, Result, Transition};
use rand::Rng;

/// Move one position toward the end.
pub const FORWARD: usize = 0;

/// Return to the start.
pub const BACKWARD: usize = 1;

/// The n-chain MDP.
#[derive(Clone, Debug)]
pub struct NChain<R: Rng> {
    n: usize,
    slip: f64,
    small: f64,
    large: f64,
    max_steps: usize,
    position: usize,
    steps: usize,
    space: ActionSpace,
    rng: R,
}

impl<R: Rng> NChain<R> {
    /// Create the classic 5-position chain (slip 0.2, rewards 2 and 10,
    /// episodes of 1000 steps).
    pub fn new(rng: R) -> Self {
        Self::with_params(rng, 5, 0.2, 2.0, 10.0, 1000)
    }

    /// Create a chain with custom parameters.
    ///
    /// # Panics
    /// Panics if `n` is zero or `slip` is outside [0, 1].
    pub fn with_params(rng: R, n: usize, slip: f64, small: f64, large: f64, max_steps: usize) -> Self {
        assert!(n > 0, "chain needs at least one position");
        assert!((0.0..=1.0).contains(&slip), "slip {} is not a probability", slip);
        Self {
            n,
            slip,
            small,
            large,
            max_steps,
            position: 0,
            steps: 0,
            space: ActionSpace::Discrete(2),
            rng,
        }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Steps taken in the current episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Go back to the start of the chain.
    pub fn reset(&mut self) -> usize {
        self.position = 0;
        self.steps = 0;
        self.position
    }

    /// Apply an action to the real episode.
    ///
    /// The chain itself never ends; the returned transition is terminal once
    /// the episode reaches `max_steps`.
    pub fn step(&mut self, action: &Action) -> Result<Transition<usize>> {
        let position = self.position;
        let mut t = self.transition(&position, action, true)?;
        self.position = t.state;
        self.steps += 1;
        t.terminal = self.steps >= self.max_steps;
        Ok(t)
    }

    fn decode(&self, action: &Action) -> Result<usize> {
        match action.as_discrete() {
            Some(a) if a == FORWARD || a == BACKWARD => Ok(a),
            _ => Err(IquctError::InvalidAction(format!(
                "n-chain expects 0 or 1, got {}",
                action
            ))),
        }
    }
}

impl<R: Rng> Environment for NChain<R> {
    type State = usize;

    fn state(&self) -> &usize {
        &self.position
    }

    fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    fn transition(&mut self, state: &usize, action: &Action, _dynamic: bool) -> Result<Transition<usize>> {
        if *state >= self.n {
            return Err(IquctError::Environment(format!(
                "position {} is off a chain of length {}",
                state, self.n
            )));
        }

        let mut a = self.decode(action)?;
        if self.rng.gen::<f64>() < self.slip {
            a = 1 - a;
        }

        let t = if a == BACKWARD {
            Transition::new(0, self.small, false)
        } else if *state + 1 < self.n {
            Transition::new(*state + 1, 0.0, false)
        } else {
            Transition::new(*state, self.large, false)
        };
        Ok(t)
    }

    fn equality_operator(&self, a: &usize, b: &usize) -> bool {
        a == b
    }

    fn features(&self, state: &usize) -> Vec<f64> {
        vec![*state as f64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn chain_without_slip() -> NChain<ChaCha8Rng> {
        NChain::with_params(ChaCha8Rng::seed_from_u64(0), 3, 0.0, 2.0, 10.0, 5)
    }

    #[test]
    fn test_forward_to_end() {
        let mut env = chain_without_slip();
        let forward = Action::Discrete(FORWARD);

        assert_eq!(env.transition(&0, &forward, false).unwrap(), Transition::new(1, 0.0, false));
        assert_eq!(env.transition(&1, &forward, false).unwrap(), Transition::new(2, 0.0, false));
        assert_eq!(env.transition(&2, &forward, false).unwrap(), Transition::new(2, 10.0, false));
    }

    #[test]
    fn test_backward_returns_to_start() {
        let mut env = chain_without_slip();
        let t = env.transition(&2, &Action::Discrete(BACKWARD), false).unwrap();
        assert_eq!(t, Transition::new(0, 2.0, false));
    }

    #[test]
    fn test_full_slip_swaps_actions() {
        let mut env = NChain::with_params(ChaCha8Rng::seed_from_u64(0), 3, 1.0, 2.0, 10.0, 5);
        let t = env.transition(&1, &Action::Discrete(FORWARD), false).unwrap();
        assert_eq!(t.state, 0);
        assert_eq!(t.reward, 2.0);
    }

    #[test]
    fn test_invalid_action() {
        let mut env = chain_without_slip();
        assert!(matches!(
            env.transition(&0, &Action::Discrete(2), false),
            Err(IquctError::InvalidAction(_))
        ));
        assert!(matches!(
            env.transition(&7, &Action::Discrete(0), false),
            Err(IquctError::Environment(_))
        ));
    }

    #[test]
    fn test_step_ends_episode_at_max_steps() {
        let mut env = chain_without_slip();
        let forward = Action::Discrete(FORWARD);

        for i in 0..5 {
            let t = env.step(&forward).unwrap();
            assert_eq!(t.terminal, i == 4);
        }
        assert_eq!(*env.state(), 2);
        assert_eq!(env.steps(), 5);

        env.reset();
        assert_eq!(*env.state(), 0);
        assert_eq!(env.steps(), 0);
    }
}
