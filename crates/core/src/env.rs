use crate::{Action, ActionSpace, Result};

/// Outcome of simulating one action from a state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S> {
    /// State reached after the action.
    pub state: S,

    /// Immediate reward collected by the transition.
    pub reward: f64,

    /// Whether the reached state ends the episode.
    pub terminal: bool,
}

impl<S> Transition<S> {
    pub fn new(state: S, reward: f64, terminal: bool) -> Self {
        Self {
            state,
            reward,
            terminal,
        }
    }
}

/// A simulatable environment for tree-search planning.
///
/// The planner never inspects states directly. It only clones them, hands
/// them back to `transition`, compares them with `equality_operator` and
/// turns them into numbers with `features` when building inputs for the
/// value model.
pub trait Environment {
    /// An environment state (e.g. the cart-pole vector)
    type State: Clone;

    /// Returns the state the agent is currently in
    fn state(&self) -> &Self::State;

    /// Returns the action space shared by every state
    fn action_space(&self) -> &ActionSpace;

    /// Simulates `action` from `state` without touching the current state.
    ///
    /// `dynamic` selects between the time-evolving model and the frozen
    /// snapshot of it; environments without a notion of time ignore it.
    fn transition(
        &mut self,
        state: &Self::State,
        action: &Action,
        dynamic: bool,
    ) -> Result<Transition<Self::State>>;

    /// Returns true if two states should be treated as the same outcome
    fn equality_operator(&self, a: &Self::State, b: &Self::State) -> bool;

    /// Numeric representation of a state, used as value model input
    fn features(&self, state: &Self::State) -> Vec<f64>;
}
