//! Arena-allocated search tree.
//!
//! Using a Vec<Node> with indices provides better cache locality
//! and simpler ownership compared to Rc<RefCell<Node>>. A tree is built for
//! a single search and dropped afterwards.

use crate::node::{ChanceNode, DecisionNode, Node, NodeId};

/// Arena-allocated search tree rooted at a decision node.
#[derive(Clone, Debug)]
pub struct SearchTree<S> {
    nodes: Vec<Node<S>>,
}

impl<S> SearchTree<S> {
    /// Create a tree holding only a root decision node for `state`.
    pub fn new(state: S, is_terminal: bool) -> Self {
        Self {
            nodes: vec![Node::Decision(DecisionNode::root(state, is_terminal))],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id.0]
    }

    /// Get a decision node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid or names a chance node.
    pub fn decision(&self, id: NodeId) -> &DecisionNode<S> {
        self.nodes[id.0]
            .as_decision()
            .expect("BUG: expected a decision node")
    }

    /// Get a chance node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid or names a decision node.
    pub fn chance(&self, id: NodeId) -> &ChanceNode {
        self.nodes[id.0]
            .as_chance()
            .expect("BUG: expected a chance node")
    }

    pub(crate) fn decision_mut(&mut self, id: NodeId) -> &mut DecisionNode<S> {
        self.nodes[id.0]
            .as_decision_mut()
            .expect("BUG: expected a decision node")
    }

    pub(crate) fn chance_mut(&mut self, id: NodeId) -> &mut ChanceNode {
        self.nodes[id.0]
            .as_chance_mut()
            .expect("BUG: expected a chance node")
    }

    /// The state labelling a chance node, i.e. its parent decision node's.
    pub fn chance_state(&self, id: NodeId) -> &S {
        let parent = self.chance(id).parent;
        &self.decision(parent).state
    }

    /// Add a new node to the tree, returning its ID.
    fn add(&mut self, node: Node<S>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Append a decision node for an outcome of the chance node `parent`.
    pub(crate) fn add_outcome(&mut self, parent: NodeId, state: S, is_terminal: bool) -> NodeId {
        let depth = self.chance(parent).depth;
        let id = self.add(Node::Decision(DecisionNode::new(
            parent,
            depth,
            state,
            is_terminal,
        )));
        self.chance_mut(parent).children.push(id);
        id
    }

    /// Append chance nodes below the decision node `parent`, in the given order.
    pub(crate) fn add_actions(&mut self, parent: NodeId, chances: Vec<ChanceNode>) {
        for chance in chances {
            let id = self.add(Node::Chance(chance));
            self.decision_mut(parent).children.push(id);
        }
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should never be true as root always exists).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the root node.
    pub fn root(&self) -> &DecisionNode<S> {
        self.decision(NodeId::ROOT)
    }

    /// Chance nodes directly below the root.
    pub fn root_children(&self) -> impl Iterator<Item = &ChanceNode> + '_ {
        self.root().children.iter().map(move |&id| self.chance(id))
    }

    /// Walk every node reachable from the root, parents before children and
    /// siblings in order.
    pub fn preorder(&self) -> Preorder<'_, S> {
        Preorder {
            tree: self,
            stack: vec![NodeId::ROOT],
        }
    }
}

/// Depth-first iterator over a tree with an explicit stack, so walks do not
/// recurse however deep the search went.
pub struct Preorder<'a, S> {
    tree: &'a SearchTree<S>,
    stack: Vec<NodeId>,
}

impl<'a, S> Iterator for Preorder<'a, S> {
    type Item = (NodeId, &'a Node<S>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id);
        self.stack.extend(node.children().iter().rev());
        Some((id, node))
    }
}
