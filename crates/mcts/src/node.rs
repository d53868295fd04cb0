//! Search tree node types.
//!
//! The tree alternates between decision nodes (labelled by a state) and
//! chance nodes (labelled by an action, the state being their parent's).
//! Nodes live in an arena and refer to each other by index; a parent link is
//! only ever followed upwards during backpropagation.

use crate::history::HistoryTuple;
use iquct_core::Action;

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Using indices instead of pointers avoids Rc/RefCell overhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A state reached during search.
#[derive(Clone, Debug)]
pub struct DecisionNode<S> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) state: S,
    pub(crate) is_terminal: bool,
    pub(crate) depth: usize,

    /// One chance node per action, in the (shuffled) order fixed at expansion.
    pub(crate) children: Vec<NodeId>,

    /// Children `[0, explored_children)` have been descended into at least once.
    pub(crate) explored_children: usize,

    pub(crate) visits: u32,
}

impl<S> DecisionNode<S> {
    /// Create the root node.
    pub fn root(state: S, is_terminal: bool) -> Self {
        Self {
            parent: None,
            state,
            is_terminal,
            depth: 0,
            children: Vec::new(),
            explored_children: 0,
            visits: 0,
        }
    }

    /// Create a node reached through the chance node `parent` at `parent_depth`.
    pub fn new(parent: NodeId, parent_depth: usize, state: S, is_terminal: bool) -> Self {
        Self {
            parent: Some(parent),
            state,
            is_terminal,
            depth: parent_depth + 1,
            children: Vec::new(),
            explored_children: 0,
            visits: 0,
        }
    }

    /// Owning chance node (`None` for the root).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn explored_children(&self) -> usize {
        self.explored_children
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }
}

/// A (state, action) pair; the state is the parent decision node's.
#[derive(Clone, Debug)]
pub struct ChanceNode {
    pub(crate) parent: NodeId,
    pub(crate) action: Action,
    pub(crate) depth: usize,

    /// Distinct outcome states, in discovery order.
    pub(crate) children: Vec<NodeId>,

    /// One discounted return per rollout that went through this node.
    pub(crate) sampled_returns: Vec<f64>,

    /// Copy of the matching history taken when the node was created.
    pub(crate) history: Vec<HistoryTuple>,
}

impl ChanceNode {
    pub fn new(parent: NodeId, depth: usize, action: Action, history: Vec<HistoryTuple>) -> Self {
        Self {
            parent,
            action,
            depth,
            children: Vec::new(),
            sampled_returns: Vec::new(),
            history,
        }
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn sampled_returns(&self) -> &[f64] {
        &self.sampled_returns
    }

    pub fn history(&self) -> &[HistoryTuple] {
        &self.history
    }

    /// Mean of the sampled returns.
    ///
    /// Returns `None` if no rollout has gone through this node yet.
    pub fn snapshot_value(&self) -> Option<f64> {
        if self.sampled_returns.is_empty() {
            None
        } else {
            Some(self.sampled_returns.iter().sum::<f64>() / self.sampled_returns.len() as f64)
        }
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub enum Node<S> {
    Decision(DecisionNode<S>),
    Chance(ChanceNode),
}

impl<S> Node<S> {
    pub fn as_decision(&self) -> Option<&DecisionNode<S>> {
        match self {
            Node::Decision(d) => Some(d),
            Node::Chance(_) => None,
        }
    }

    pub fn as_chance(&self) -> Option<&ChanceNode> {
        match self {
            Node::Chance(c) => Some(c),
            Node::Decision(_) => None,
        }
    }

    pub(crate) fn as_decision_mut(&mut self) -> Option<&mut DecisionNode<S>> {
        match self {
            Node::Decision(d) => Some(d),
            Node::Chance(_) => None,
        }
    }

    pub(crate) fn as_chance_mut(&mut self) -> Option<&mut ChanceNode> {
        match self {
            Node::Chance(c) => Some(c),
            Node::Decision(_) => None,
        }
    }

    /// Parent node, `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Decision(d) => d.parent,
            Node::Chance(c) => Some(c.parent),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Decision(d) => &d.children,
            Node::Chance(c) => &c.children,
        }
    }
}
