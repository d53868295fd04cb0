//! Property-based tests for the environments.
//!
//! These tests use proptest to generate random states and action sequences
//! and check the invariants the planner relies on: transitions never touch
//! the current state, outcomes stay in range and equal inputs give equal
//! outcomes when there is no noise.

use iquct_core::{Action, Environment};
use iquct_envs::{CartPole, CartPoleState, NChain, PoleDrift};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Strategies
// =============================================================================

/// Generate a cart-pole state inside the non-failed region
fn arb_cartpole_state() -> impl Strategy<Value = CartPoleState> {
    (
        -2.0f64..2.0,
        -1.0f64..1.0,
        -0.2f64..0.2,
        -1.0f64..1.0,
        0usize..200,
    )
        .prop_map(|(x, x_dot, theta, theta_dot, time)| CartPoleState {
            x,
            x_dot,
            theta,
            theta_dot,
            time,
        })
}

/// Generate a sequence of n-chain actions
fn arb_actions() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..2, 0..100)
}

// =============================================================================
// Cart-pole
// =============================================================================

proptest! {
    /// Planning transitions leave the real episode untouched
    #[test]
    fn prop_cartpole_transition_is_pure(
        seed in any::<u64>(),
        state in arb_cartpole_state(),
        action in 0usize..2,
    ) {
        let mut env = CartPole::new(ChaCha8Rng::seed_from_u64(seed));
        let before = *env.state();

        let t = env.transition(&state, &Action::Discrete(action), false).unwrap();

        prop_assert_eq!(*env.state(), before);
        prop_assert_eq!(t.state.time, state.time + 1);
        prop_assert_eq!(t.reward, 1.0);
        prop_assert_eq!(t.terminal, t.state.is_failed());
    }

    /// Without force noise, the same input always yields an equal outcome
    #[test]
    fn prop_cartpole_deterministic(
        seed in any::<u64>(),
        state in arb_cartpole_state(),
        action in 0usize..2,
        dynamic in any::<bool>(),
    ) {
        let drift = PoleDrift { amplitude: 0.3, period: 50.0 };
        let mut env = CartPole::dynamic(ChaCha8Rng::seed_from_u64(seed), drift);

        let a = env.transition(&state, &Action::Discrete(action), dynamic).unwrap();
        let b = env.transition(&state, &Action::Discrete(action), dynamic).unwrap();

        prop_assert!(env.equality_operator(&a.state, &b.state));
        prop_assert_eq!(env.features(&a.state).len(), 4);
    }

    /// Force noise makes outcomes differ but keeps the step structure
    #[test]
    fn prop_cartpole_noise_keeps_time(
        seed in any::<u64>(),
        state in arb_cartpole_state(),
    ) {
        let mut env = CartPole::new(ChaCha8Rng::seed_from_u64(seed))
            .with_force_noise(1.0)
            .unwrap();

        let t = env.transition(&state, &Action::Discrete(1), false).unwrap();
        prop_assert_eq!(t.state.time, state.time + 1);
        prop_assert!(t.state.x_dot.is_finite() && t.state.theta_dot.is_finite());
    }
}

// =============================================================================
// N-chain
// =============================================================================

proptest! {
    /// Every reachable position stays on the chain
    #[test]
    fn prop_nchain_stays_on_chain(seed in any::<u64>(), actions in arb_actions()) {
        let mut env = NChain::new(ChaCha8Rng::seed_from_u64(seed));

        for a in actions {
            let t = env.step(&Action::Discrete(a)).unwrap();
            prop_assert!(t.state < env.len());
            prop_assert!(t.reward == 0.0 || t.reward == 2.0 || t.reward == 10.0);
            // Only a return to the start pays the small reward
            if t.reward == 2.0 {
                prop_assert_eq!(t.state, 0);
            }
        }
    }

    /// The large reward is only paid at the end of the chain
    #[test]
    fn prop_nchain_large_reward_at_end(seed in any::<u64>(), position in 0usize..5) {
        let mut env = NChain::new(ChaCha8Rng::seed_from_u64(seed));
        let t = env.transition(&position, &Action::Discrete(0), false).unwrap();

        if t.reward == 10.0 {
            prop_assert_eq!(position, 4);
            prop_assert_eq!(t.state, 4);
        }
    }
}

/// Slipping happens at roughly the configured rate
#[test]
fn test_nchain_slip_rate() {
    let mut env = NChain::new(ChaCha8Rng::seed_from_u64(99));
    let trials = 5000;

    let slipped = (0..trials)
        .filter(|_| {
            let t = env.transition(&1, &Action::Discrete(0), false).unwrap();
            t.state == 0
        })
        .count();

    let rate = slipped as f64 / trials as f64;
    assert!((rate - 0.2).abs() < 0.03, "slip rate {} far from 0.2", rate);
}
