//! IQ-UCT Environments - Simulators to plan against
//!
//! This crate implements `iquct_core::Environment` for two classic control
//! problems used to exercise the planner:
//!
//! - [`CartPole`] - deterministic (optionally noisy) pole balancing, with a
//!   dynamic variant whose pole length changes over time
//! - [`NChain`] - a stochastic chain where actions slip, rewarding lookahead

mod cartpole;
mod nchain;

pub use cartpole::{CartPole, CartPoleState, PoleDrift};
pub use nchain::{NChain, BACKWARD, FORWARD};
