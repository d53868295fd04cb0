//! Cross-search memory of (state, action) value observations.
//!
//! Histories are keyed by raw state and action, not by tree position, so an
//! observation made in one search is found again whenever an equal
//! (state, action) pair shows up in a later tree. Matching uses the
//! environment's `equality_operator`, which rules out hashing; lookups are a
//! linear scan in insertion order.

use iquct_core::{Action, Environment};
use serde::{Deserialize, Serialize};

/// One observation: the depth a (state, action) pair was seen at and its
/// empirical value at the end of that search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryTuple {
    pub depth: usize,
    pub value: f64,
}

impl HistoryTuple {
    pub fn new(depth: usize, value: f64) -> Self {
        Self { depth, value }
    }
}

/// All observations collected for one (state, action) pair.
#[derive(Clone, Debug)]
pub struct History<S> {
    state: S,
    action: Action,
    data: Vec<HistoryTuple>,
}

impl<S> History<S> {
    pub fn new(state: S, action: Action) -> Self {
        Self {
            state,
            action,
            data: Vec::new(),
        }
    }

    /// True if this history is keyed by `(state, action)`.
    pub fn corresponds_to<E>(&self, env: &E, state: &S, action: &Action) -> bool
    where
        E: Environment<State = S>,
    {
        self.action == *action && env.equality_operator(&self.state, state)
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Observations in the order they were recorded.
    pub fn data(&self) -> &[HistoryTuple] {
        &self.data
    }

    fn push(&mut self, tuple: HistoryTuple) {
        self.data.push(tuple);
    }
}

/// Append-only collection of histories, persisted across searches.
#[derive(Clone, Debug)]
pub struct HistoryStore<S> {
    histories: Vec<History<S>>,
}

impl<S: Clone> HistoryStore<S> {
    pub fn new() -> Self {
        Self {
            histories: Vec::new(),
        }
    }

    /// First history keyed by `(state, action)`, if any.
    pub fn find<E>(&self, env: &E, state: &S, action: &Action) -> Option<&History<S>>
    where
        E: Environment<State = S>,
    {
        self.histories
            .iter()
            .find(|h| h.corresponds_to(env, state, action))
    }

    /// Append an observation to the matching history, creating it if needed.
    pub fn record<E>(&mut self, env: &E, state: &S, action: &Action, tuple: HistoryTuple)
    where
        E: Environment<State = S>,
    {
        match self
            .histories
            .iter_mut()
            .find(|h| h.corresponds_to(env, state, action))
        {
            Some(history) => history.push(tuple),
            None => {
                let mut history = History::new(state.clone(), action.clone());
                history.push(tuple);
                self.histories.push(history);
            }
        }
    }

    /// Number of distinct (state, action) keys.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Total number of observations over all keys.
    pub fn observations(&self) -> usize {
        self.histories.iter().map(|h| h.data.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &History<S>> {
        self.histories.iter()
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

impl<S: Clone> Default for HistoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
