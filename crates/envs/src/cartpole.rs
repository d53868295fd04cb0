//! Cart-pole environment with an optionally time-varying pole.
//!
//! Classic cart-pole dynamics integrated with explicit Euler steps. In the
//! dynamic variant the pole's half-length oscillates with episode time, so a
//! planner must choose between simulating with the evolving pole
//! (`dynamic = true`) or with the pole frozen at its current length
//! (`dynamic = false`, a snapshot of the model at decision time).

use iquct_core::{Action, ActionSpace, Environment, IquctError, Result, Transition};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use std::f64::consts::PI;

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;

/// Pole half-length of the static cart-pole.
const HALF_LENGTH: f64 = 0.5;

/// Angle at which the pole counts as fallen (12 degrees).
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * PI / 360.0;

/// Distance from the centre at which the cart leaves the track.
const X_THRESHOLD: f64 = 2.4;

/// Cart-pole state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CartPoleState {
    pub x: f64,
    pub x_dot: f64,
    pub theta: f64,
    pub theta_dot: f64,

    /// Integration steps since the episode started.
    pub time: usize,
}

impl CartPoleState {
    /// True once the pole has fallen or the cart has left the track.
    pub fn is_failed(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }
}

/// Pole length variation for the dynamic variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoleDrift {
    /// Relative amplitude of the half-length oscillation.
    pub amplitude: f64,

    /// Oscillation period in integration steps.
    pub period: f64,
}

/// The cart-pole balancing task.
#[derive(Clone, Debug)]
pub struct CartPole<R: Rng> {
    state: CartPoleState,
    space: ActionSpace,
    drift: Option<PoleDrift>,
    noise: Option<Normal<f64>>,
    max_steps: usize,
    tolerance: f64,
    rng: R,
}

impl<R: Rng> CartPole<R> {
    /// Create a static cart-pole with episodes of at most 200 steps.
    pub fn new(rng: R) -> Self {
        let mut env = Self {
            state: CartPoleState {
                x: 0.0,
                x_dot: 0.0,
                theta: 0.0,
                theta_dot: 0.0,
                time: 0,
            },
            space: ActionSpace::Discrete(2),
            drift: None,
            noise: None,
            max_steps: 200,
            tolerance: 1e-9,
            rng,
        };
        env.reset();
        env
    }

    /// Create a cart-pole whose pole length oscillates over time.
    pub fn dynamic(rng: R, drift: PoleDrift) -> Self {
        let mut env = Self::new(rng);
        env.drift = Some(drift);
        env
    }

    /// Add Gaussian noise with standard deviation `std` to the applied force.
    ///
    /// # Errors
    /// Returns `Environment` if `std` is negative or not finite.
    pub fn with_force_noise(mut self, std: f64) -> Result<Self> {
        // Normal::new only rejects non-finite deviations
        if !(std >= 0.0 && std.is_finite()) {
            return Err(IquctError::Environment(format!(
                "force noise deviation {} must be a non-negative real",
                std
            )));
        }
        let normal = Normal::new(0.0, std)
            .map_err(|e| IquctError::Environment(format!("invalid force noise: {}", e)))?;
        self.noise = Some(normal);
        Ok(self)
    }

    /// Treat states closer than `tolerance` (max-norm) as the same outcome.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Start a new episode from a small random perturbation of upright.
    pub fn reset(&mut self) -> CartPoleState {
        let init = Uniform::new_inclusive(-0.05, 0.05);
        self.state = CartPoleState {
            x: init.sample(&mut self.rng),
            x_dot: init.sample(&mut self.rng),
            theta: init.sample(&mut self.rng),
            theta_dot: init.sample(&mut self.rng),
            time: 0,
        };
        self.state
    }

    /// Apply an action to the real episode, always with the evolving pole.
    ///
    /// The transition is terminal when the pole falls or the episode
    /// reaches its step limit.
    pub fn step(&mut self, action: &Action) -> Result<Transition<CartPoleState>> {
        let state = self.state;
        let mut t = self.transition(&state, action, true)?;
        self.state = t.state;
        t.terminal = t.terminal || t.state.time >= self.max_steps;
        Ok(t)
    }

    /// Pole half-length at `time`.
    pub fn half_length(&self, time: usize) -> f64 {
        match self.drift {
            Some(d) if d.period > 0.0 => {
                HALF_LENGTH * (1.0 + d.amplitude * (2.0 * PI * time as f64 / d.period).sin())
            }
            _ => HALF_LENGTH,
        }
    }

    fn force(&mut self, action: &Action) -> Result<f64> {
        let direction = match action.as_discrete() {
            Some(0) => -1.0,
            Some(1) => 1.0,
            _ => {
                return Err(IquctError::InvalidAction(format!(
                    "cart-pole expects 0 or 1, got {}",
                    action
                )))
            }
        };
        let noise = match &self.noise {
            Some(normal) => normal.sample(&mut self.rng),
            None => 0.0,
        };
        Ok(direction * FORCE_MAG + noise)
    }
}

impl<R: Rng> Environment for CartPole<R> {
    type State = CartPoleState;

    fn state(&self) -> &CartPoleState {
        &self.state
    }

    fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    fn transition(
        &mut self,
        state: &CartPoleState,
        action: &Action,
        dynamic: bool,
    ) -> Result<Transition<CartPoleState>> {
        let force = self.force(action)?;

        // A snapshot model keeps the pole as it is right now
        let length = if dynamic {
            self.half_length(state.time)
        } else {
            self.half_length(self.state.time)
        };

        let total_mass = MASS_CART + MASS_POLE;
        let polemass_length = MASS_POLE * length;
        let (sin, cos) = state.theta.sin_cos();

        let temp = (force + polemass_length * state.theta_dot * state.theta_dot * sin) / total_mass;
        let theta_acc = (GRAVITY * sin - cos * temp)
            / (length * (4.0 / 3.0 - MASS_POLE * cos * cos / total_mass));
        let x_acc = temp - polemass_length * theta_acc * cos / total_mass;

        let next = CartPoleState {
            x: state.x + TAU * state.x_dot,
            x_dot: state.x_dot + TAU * x_acc,
            theta: state.theta + TAU * state.theta_dot,
            theta_dot: state.theta_dot + TAU * theta_acc,
            time: state.time + 1,
        };

        Ok(Transition::new(next, 1.0, next.is_failed()))
    }

    fn equality_operator(&self, a: &CartPoleState, b: &CartPoleState) -> bool {
        a.time == b.time
            && (a.x - b.x).abs() <= self.tolerance
            && (a.x_dot - b.x_dot).abs() <= self.tolerance
            && (a.theta - b.theta).abs() <= self.tolerance
            && (a.theta_dot - b.theta_dot).abs() <= self.tolerance
    }

    fn features(&self, state: &CartPoleState) -> Vec<f64> {
        vec![state.x, state.x_dot, state.theta, state.theta_dot]
    }
}
