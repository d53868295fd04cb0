//! Approximate inferred-Q UCT (IQ-UCT) planning.
//!
//! This crate provides a tree search that plans against any environment
//! implementing the `iquct_core::Environment` trait and generalizes value
//! estimates across searches with a pluggable value model.
//!
//! # Features
//!
//! - **Generic**: Works with any `Environment` whose action space can be enumerated
//! - **UCB Selection**: Scores actions with inferred values plus an exploration bonus
//! - **History Store**: Remembers (state, action) values across calls to `act`
//! - **Value Model Abstraction**: Any regressor implementing `ValueModel`
//! - **Default Policy Abstraction**: Uniform sampling or an injected rollout policy
//!
//! # Example
//!
//! ```
//! use iquct_envs::NChain;
//! use iquct_mcts::{EmpiricalModel, IqUct, IqUctConfig, UniformPolicy};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut env = NChain::new(ChaCha8Rng::seed_from_u64(7));
//!
//! let config = IqUctConfig::with_rollouts(100);
//! let policy = UniformPolicy::new(ChaCha8Rng::seed_from_u64(1));
//! let mut agent = IqUct::new(config, EmpiricalModel, policy, ChaCha8Rng::seed_from_u64(42))
//!     .expect("valid config");
//!
//! let action = agent.act(&mut env, false).expect("search succeeds");
//! println!("Chosen action: {}", action);
//! println!("Histories kept: {}", agent.histories().len());
//! ```

pub mod config;
pub mod history;
pub mod model;
mod node;
pub mod policy;
pub mod search;
mod tree;

pub use config::IqUctConfig;
pub use history::{History, HistoryStore, HistoryTuple};
pub use model::{feature_vector, EmpiricalModel, TrainingExample, ValueModel};
pub use node::{ChanceNode, DecisionNode, Node, NodeId};
pub use policy::{DefaultPolicy, UniformPolicy};
pub use search::IqUct;
pub use tree::{Preorder, SearchTree};
