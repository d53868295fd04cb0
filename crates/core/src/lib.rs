//! IQ-UCT Core - Environment abstractions and common types
//!
//! This crate provides the `Environment` trait that a simulator must
//! implement to be planned against, together with the action spaces the
//! planner enumerates.
//!
//! # Types
//!
//! - [`Environment`] - Trait for simulatable environments
//! - [`ActionSpace`] - Discrete, tuple and box action spaces
//! - [`Action`] - A member of an action space

mod env;
mod error;
mod space;

pub use env::{Environment, Transition};
pub use error::{IquctError, Result};
pub use space::{Action, ActionSpace};
