//! Inferred-value UCT search.
//!
//! Each call to `act` grows a fresh tree from the environment's current
//! state with a fixed number of rollouts (select -> expand -> evaluate ->
//! backpropagate), then feeds what the tree learned back into the
//! cross-search history and the value model before picking an action.
//!
//! Chance nodes are scored with
//!
//! ```text
//! UCB(a) = inferred_value(a) + C * sqrt(ln(N_parent) / N(a))
//! ```
//!
//! where the inferred value comes from the value model whenever the
//! (state, action) pair has been seen in an earlier search, and from the
//! node's own mean return otherwise.

use crate::{
    config::IqUctConfig,
    history::{HistoryStore, HistoryTuple},
    model::{feature_vector, TrainingExample, ValueModel},
    node::{ChanceNode, Node, NodeId},
    policy::DefaultPolicy,
    tree::SearchTree,
};
use iquct_core::{Action, Environment, IquctError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace, warn};

/// Chance nodes visited by one rollout, root first, each with the reward it
/// collected if it was transitioned during selection.
type Path = Vec<(NodeId, Option<f64>)>;

/// Approximate inferred-Q UCT agent.
///
/// Generic over:
/// - `E`: The environment being planned against
/// - `M`: The value model generalizing across (state, depth, value)
/// - `P`: The default rollout policy
/// - `R`: The random number generator shuffling new chance nodes
///
/// The history store and the value model persist across calls to `act`;
/// `reset` clears both together.
pub struct IqUct<E: Environment, M: ValueModel, P: DefaultPolicy<E>, R: Rng> {
    config: IqUctConfig,
    model: M,
    policy: P,
    rng: R,
    histories: HistoryStore<E::State>,
}

impl<E, M, P, R> IqUct<E, M, P, R>
where
    E: Environment,
    M: ValueModel,
    P: DefaultPolicy<E>,
    R: Rng,
{
    /// Create a new agent.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration is out of range.
    pub fn new(config: IqUctConfig, model: M, policy: P, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model,
            policy,
            rng,
            histories: HistoryStore::new(),
        })
    }

    pub fn config(&self) -> &IqUctConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn histories(&self) -> &HistoryStore<E::State> {
        &self.histories
    }

    /// Forget all histories and reset the value model.
    pub fn reset(&mut self) {
        self.histories.clear();
        self.model.reset();
    }

    /// Plan from the environment's current state and return the action to take.
    ///
    /// A terminal root is not searched; the first enumerated action is
    /// returned so the caller always gets a member of the action space.
    pub fn act(&mut self, env: &mut E, root_terminal: bool) -> Result<Action> {
        let tree = self.search(env, root_terminal)?;
        // Histories only move on once the model accepted the tree's data
        self.update_model(env, &tree)?;
        self.update_histories(env, &tree);

        match self.best_action(env, &tree)? {
            Some(action) => Ok(action),
            None => {
                warn!("root has no searched action, falling back to the first enumerated one");
                env.action_space()
                    .enumerate()?
                    .into_iter()
                    .next()
                    .ok_or(IquctError::EmptyActionSpace)
            }
        }
    }

    /// Run the configured number of rollouts and return the finished tree.
    ///
    /// Neither the histories nor the model are touched; `act` does that once
    /// the search is over.
    pub fn search(&mut self, env: &mut E, root_terminal: bool) -> Result<SearchTree<E::State>> {
        let mut tree = SearchTree::new(env.state().clone(), root_terminal);

        if root_terminal {
            debug!("root is terminal, skipping search");
            return Ok(tree);
        }

        for _ in 0..self.config.rollouts {
            self.rollout(env, &mut tree)?;
        }

        debug!(
            rollouts = self.config.rollouts,
            nodes = tree.len(),
            root_visits = tree.root().visits(),
            "search finished"
        );
        Ok(tree)
    }

    /// Run a single rollout: select -> expand -> evaluate -> backpropagate.
    fn rollout(&mut self, env: &mut E, tree: &mut SearchTree<E::State>) -> Result<()> {
        let dynamic = self.config.dynamic_model;
        let mut path: Path = Vec::new();
        let mut current = NodeId::ROOT;
        let mut terminal = false;
        let mut outcome: Option<(E::State, bool)> = None;

        // SELECT: descend while the tree already has a root expansion
        if !tree.root().children().is_empty() {
            loop {
                match tree.get(current) {
                    Node::Decision(node) => {
                        if node.is_terminal {
                            // Evaluate from the chance node that led here
                            current = node.parent.expect("BUG: terminal root reached selection");
                            terminal = true;
                            break;
                        }

                        if node.explored_children < node.children.len() {
                            let child = node.children[node.explored_children];
                            tree.decision_mut(current).explored_children += 1;
                            path.push((child, None));
                            current = child;
                            terminal = false;
                            break;
                        }

                        let child = self.select_child(env, tree, current)?;
                        path.push((child, None));
                        current = child;
                        terminal = false;
                    }
                    Node::Chance(node) => {
                        let step =
                            env.transition(tree.chance_state(current), &node.action, dynamic)?;
                        path.last_mut()
                            .expect("BUG: chance node reached without a path entry")
                            .1 = Some(step.reward);

                        let matched = node
                            .children
                            .iter()
                            .copied()
                            .find(|&child| env.equality_operator(tree.decision(child).state(), &step.state));

                        match matched {
                            Some(child) => current = child,
                            None => {
                                outcome = Some((step.state, step.terminal));
                                break;
                            }
                        }
                    }
                }
            }
        }

        // EXPAND: a new outcome first, then the decision node we stand on
        if let Some((state, is_terminal)) = outcome {
            current = tree.add_outcome(current, state, is_terminal);
        }

        let standing_on = match tree.get(current) {
            Node::Decision(node) => Some((node.is_terminal, node.parent)),
            Node::Chance(_) => None,
        };
        match standing_on {
            Some((true, parent)) => {
                current = parent.expect("BUG: terminal root cannot be expanded");
                terminal = true;
            }
            Some((false, _)) => {
                let first = self.expand(env, tree, current)?;
                path.push((first, None));
                current = first;
                terminal = false;
            }
            None => {}
        }

        // EVALUATE
        let estimate = if terminal {
            0.0
        } else {
            self.evaluate(env, tree, current)?
        };

        trace!(
            leaf_depth = tree.chance(current).depth(),
            path_len = path.len(),
            estimate,
            "rollout"
        );

        // BACKPROPAGATE
        self.backpropagate(tree, &path, estimate);
        Ok(())
    }

    /// Expand a decision node with one chance node per action, in random
    /// order, and descend into the first one.
    fn expand(&mut self, env: &E, tree: &mut SearchTree<E::State>, node_id: NodeId) -> Result<NodeId> {
        let actions = env.action_space().enumerate()?;
        if actions.is_empty() {
            return Err(IquctError::EmptyActionSpace);
        }

        let node = tree.decision(node_id);
        let mut chances: Vec<ChanceNode> = actions
            .into_iter()
            .map(|action| {
                let history = self
                    .histories
                    .find(env, &node.state, &action)
                    .map(|h| h.data().to_vec())
                    .unwrap_or_default();
                ChanceNode::new(node_id, node.depth, action, history)
            })
            .collect();
        chances.shuffle(&mut self.rng);

        tree.add_actions(node_id, chances);
        let node = tree.decision_mut(node_id);
        node.explored_children += 1;
        Ok(node.children[0])
    }

    /// Estimate a fresh leaf with a default-policy rollout.
    ///
    /// The leaf's own action is simulated first, then the default policy
    /// takes over until the episode ends or `leaf.depth + t > max_depth`.
    fn evaluate(&mut self, env: &mut E, tree: &SearchTree<E::State>, leaf: NodeId) -> Result<f64> {
        let chance = tree.chance(leaf);
        let depth = chance.depth;
        let mut state = tree.chance_state(leaf).clone();
        let mut action = chance.action.clone();

        let mut estimate = 0.0;
        let mut discount = 1.0;
        let mut t = 0;
        loop {
            let step = env.transition(&state, &action, self.config.dynamic_model)?;
            estimate += step.reward * discount;
            discount *= self.config.gamma;
            t += 1;
            state = step.state;

            if step.terminal || depth + t > self.config.max_depth {
                break;
            }
            action = self.policy.sample_action(env, &state)?;
        }

        Ok(estimate)
    }

    /// Push the estimate up the path, folding in each collected reward.
    ///
    /// Rewards are consumed leaf to root:
    /// `estimate = reward + gamma * estimate`.
    fn backpropagate(&self, tree: &mut SearchTree<E::State>, path: &[(NodeId, Option<f64>)], leaf_estimate: f64) {
        let mut estimate = leaf_estimate;

        for &(chance_id, reward) in path.iter().rev() {
            if let Some(reward) = reward {
                estimate = reward + self.config.gamma * estimate;
            }
            let chance = tree.chance_mut(chance_id);
            chance.sampled_returns.push(estimate);
            let parent = chance.parent;
            tree.decision_mut(parent).visits += 1;
        }
    }

    /// Select the child chance node with the highest UCB score; ties go to
    /// the first one.
    fn select_child(&self, env: &E, tree: &SearchTree<E::State>, node_id: NodeId) -> Result<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;

        for &child in tree.decision(node_id).children() {
            let score = self.ucb(env, tree, child)?;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }

        // INVARIANT: This is only called on expanded nodes with children
        Ok(best
            .expect("BUG: select_child called on node without children")
            .0)
    }

    /// Upper confidence bound of a chance node using its inferred value.
    fn ucb(&self, env: &E, tree: &SearchTree<E::State>, chance_id: NodeId) -> Result<f64> {
        let chance = tree.chance(chance_id);
        let parent_visits = tree.decision(chance.parent).visits;
        let samples = chance.sampled_returns.len();

        // INVARIANT: unexplored children are always tried before scoring
        assert!(
            parent_visits > 0 && samples > 0,
            "BUG: UCB score requested for an unvisited chance node"
        );

        let exploration = ((parent_visits as f64).ln() / samples as f64).sqrt();
        Ok(self.inferred_value(env, tree, chance_id)? + self.config.ucb_constant * exploration)
    }

    /// Value of a chance node as seen by the value model.
    ///
    /// Falls back to the node's mean return when its (state, action) pair has
    /// no history.
    ///
    /// # Errors
    /// Returns `Unvisited` if the node has no sampled return, and propagates
    /// value model failures.
    pub fn inferred_value(&self, env: &E, tree: &SearchTree<E::State>, chance_id: NodeId) -> Result<f64> {
        let chance = tree.chance(chance_id);
        let value = chance.snapshot_value().ok_or(IquctError::Unvisited)?;

        if chance.history.is_empty() {
            return Ok(value);
        }

        let x = feature_vector(&env.features(tree.chance_state(chance_id)), chance.depth, value);
        self.model.prediction_at(&chance.action, &x)
    }

    /// Record the current value of every visited (state, action) pair of the
    /// tree in the history store.
    pub fn update_histories(&mut self, env: &E, tree: &SearchTree<E::State>) {
        let before = self.histories.observations();

        for (id, node) in tree.preorder() {
            if let Node::Chance(chance) = node {
                if let Some(value) = chance.snapshot_value() {
                    self.histories.record(
                        env,
                        tree.chance_state(id),
                        &chance.action,
                        HistoryTuple::new(chance.depth, value),
                    );
                }
            }
        }

        debug!(
            added = self.histories.observations() - before,
            keys = self.histories.len(),
            "histories updated"
        );
    }

    /// Derive training examples from the tree.
    ///
    /// Every tuple of a chance node's frozen history becomes one example
    /// whose target is the node's current mean return. Nodes the search never
    /// went through have no target and contribute nothing.
    pub fn extract_data(&self, env: &E, tree: &SearchTree<E::State>) -> Vec<TrainingExample> {
        let mut data = Vec::new();

        for (id, node) in tree.preorder() {
            let Node::Chance(chance) = node else {
                continue;
            };
            if chance.history.is_empty() {
                continue;
            }
            let Some(target) = chance.snapshot_value() else {
                continue;
            };

            let state_features = env.features(tree.chance_state(id));
            for tuple in &chance.history {
                data.push(TrainingExample {
                    action: chance.action.clone(),
                    features: feature_vector(&state_features, tuple.depth, tuple.value),
                    target,
                });
            }
        }

        data
    }

    /// Train the value model on the tree's data, returning the batch size.
    ///
    /// An empty batch is skipped without calling the model.
    pub fn update_model(&mut self, env: &E, tree: &SearchTree<E::State>) -> Result<usize> {
        let data = self.extract_data(env, tree);
        if data.is_empty() {
            debug!("no training data, model left unchanged");
            return Ok(0);
        }

        self.model.update(&data)?;
        debug!(examples = data.len(), "model updated");
        Ok(data.len())
    }

    /// Action of the root child with the highest inferred value; ties go to
    /// the first one. Children no rollout went through are skipped.
    ///
    /// Returns `None` if no root child has been searched.
    pub fn best_action(&self, env: &E, tree: &SearchTree<E::State>) -> Result<Option<Action>> {
        let mut best: Option<(NodeId, f64)> = None;

        for &child in tree.root().children() {
            if tree.chance(child).sampled_returns.is_empty() {
                continue;
            }
            let value = self.inferred_value(env, tree, child)?;
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((child, value));
            }
        }

        Ok(best.map(|(id, _)| tree.chance(id).action.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::EmpiricalModel, policy::UniformPolicy};
    use iquct_core::{ActionSpace, Transition};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Three-step ladder with two actions.
    // Action 0 pays 0.6. Action 1 pays 0.5, or 2.0 if the previous action was
    // also 1. Always climbing with action 1 is optimal (0.5 + 2 + 2 = 4.5).
    #[derive(Clone, Debug, PartialEq)]
    struct Rung {
        t: usize,
        prev: Option<usize>,
    }

    struct Ladder {
        state: Rung,
        space: ActionSpace,
    }

    impl Ladder {
        fn new() -> Self {
            Self {
                state: Rung { t: 0, prev: None },
                space: ActionSpace::Discrete(2),
            }
        }
    }

    impl Environment for Ladder {
        type State = Rung;

        fn state(&self) -> &Rung {
            &self.state
        }

        fn action_space(&self) -> &ActionSpace {
            &self.space
        }

        fn transition(&mut self, state: &Rung, action: &Action, _dynamic: bool) -> Result<Transition<Rung>> {
            let a = action
                .as_discrete()
                .ok_or_else(|| IquctError::InvalidAction(action.to_string()))?;
            let reward = match (a, state.prev) {
                (0, _) => 0.6,
                (_, Some(1)) => 2.0,
                _ => 0.5,
            };
            let next = Rung {
                t: state.t + 1,
                prev: Some(a),
            };
            let terminal = next.t >= 3;
            Ok(Transition::new(next, reward, terminal))
        }

        fn equality_operator(&self, a: &Rung, b: &Rung) -> bool {
            a == b
        }

        fn features(&self, state: &Rung) -> Vec<f64> {
            vec![state.t as f64, state.prev.map_or(-1.0, |p| p as f64)]
        }
    }

    /// Model recording every batch it is trained on.
    #[derive(Clone, Default)]
    struct RecordingModel {
        batches: Rc<RefCell<Vec<Vec<TrainingExample>>>>,
        resets: Rc<RefCell<usize>>,
        prediction: f64,
    }

    impl ValueModel for RecordingModel {
        fn prediction_at(&self, _action: &Action, _features: &[f64]) -> Result<f64> {
            Ok(self.prediction)
        }

        fn update(&mut self, batch: &[TrainingExample]) -> Result<()> {
            self.batches.borrow_mut().push(batch.to_vec());
            Ok(())
        }

        fn reset(&mut self) {
            *self.resets.borrow_mut() += 1;
        }
    }

    /// Model rejecting every batch.
    struct FailingModel;

    impl ValueModel for FailingModel {
        fn prediction_at(&self, _action: &Action, features: &[f64]) -> Result<f64> {
            Ok(features.last().copied().unwrap_or(0.0))
        }

        fn update(&mut self, _batch: &[TrainingExample]) -> Result<()> {
            Err(IquctError::Model("rejected".to_string()))
        }

        fn reset(&mut self) {}
    }

    type Agent<M> = IqUct<Ladder, M, UniformPolicy<ChaCha8Rng>, ChaCha8Rng>;

    fn create_agent<M: ValueModel>(seed: u64, rollouts: usize, model: M) -> Agent<M> {
        let config = IqUctConfig {
            gamma: 1.0,
            rollouts,
            max_depth: 10,
            // Ladder returns span 1.6..4.5
            ucb_constant: 4.5,
            dynamic_model: false,
        };
        let policy = UniformPolicy::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)));
        IqUct::new(config, model, policy, ChaCha8Rng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_act_basic() {
        let mut env = Ladder::new();
        let mut agent = create_agent(42, 50, EmpiricalModel);

        let action = agent.act(&mut env, false).unwrap();
        assert!(env.action_space().contains(&action));
    }

    #[test]
    fn test_act_finds_optimal_first_action() {
        for seed in 0..10 {
            let mut env = Ladder::new();
            let mut agent = create_agent(seed, 50, EmpiricalModel);

            let action = agent.act(&mut env, false).unwrap();
            assert_eq!(action, Action::Discrete(1), "seed {}", seed);
        }
    }

    #[test]
    fn test_root_samples_match_rollouts() {
        let mut env = Ladder::new();
        let mut agent = create_agent(7, 40, EmpiricalModel);

        let tree = agent.search(&mut env, false).unwrap();

        // Every rollout goes through exactly one root child
        let total: usize = tree.root_children().map(|c| c.sampled_returns().len()).sum();
        assert_eq!(total, 40);
        assert_eq!(tree.root().visits(), 40);
    }

    #[test]
    fn test_every_action_tried_once_first() {
        let mut env = Ladder::new();
        let mut agent = create_agent(3, 2, EmpiricalModel);

        let tree = agent.search(&mut env, false).unwrap();

        assert_eq!(tree.root().explored_children(), 2);
        assert!(tree.root_children().all(|c| c.sampled_returns().len() == 1));
    }

    #[test]
    fn test_leaf_evaluation_starts_with_own_action() {
        let config = IqUctConfig {
            gamma: 1e-9,
            rollouts: 2,
            max_depth: 1,
            ucb_constant: 4.5,
            dynamic_model: false,
        };
        for seed in 0..5 {
            let mut env = Ladder::new();
            let policy = UniformPolicy::new(ChaCha8Rng::seed_from_u64(seed + 1));
            let mut agent: Agent<EmpiricalModel> =
                IqUct::new(config.clone(), EmpiricalModel, policy, ChaCha8Rng::seed_from_u64(seed)).unwrap();

            let tree = agent.search(&mut env, false).unwrap();

            // Later steps are discounted away, leaving the first reward
            for child in tree.root_children() {
                let expected = match child.action() {
                    Action::Discrete(0) => 0.6,
                    _ => 0.5,
                };
                let g = child.sampled_returns()[0];
                assert!((g - expected).abs() < 1e-6, "seed {} {}: {}", seed, child.action(), g);
            }
        }
    }

    #[test]
    fn test_single_rollout_leaves_sibling_unexplored() {
        let mut env = Ladder::new();
        let mut agent = create_agent(3, 1, EmpiricalModel);

        let tree = agent.search(&mut env, false).unwrap();
        let samples: Vec<usize> = tree.root_children().map(|c| c.sampled_returns().len()).collect();
        assert_eq!(samples, vec![1, 0]);

        // The unexplored child is skipped when choosing
        let action = agent.best_action(&env, &tree).unwrap().unwrap();
        assert_eq!(Some(&action), tree.root_children().next().map(|c| c.action()));
    }

    #[test]
    fn test_outcomes_deduplicated() {
        let mut env = Ladder::new();
        let mut agent = create_agent(11, 60, EmpiricalModel);

        let tree = agent.search(&mut env, false).unwrap();

        // A deterministic environment yields one outcome per chance node
        for (_, node) in tree.preorder() {
            if let Node::Chance(chance) = node {
                assert!(chance.children().len() <= 1);
            }
        }
    }

    #[test]
    fn test_terminal_root_is_not_expanded() {
        let mut env = Ladder::new();
        let model = RecordingModel::default();
        let batches = model.batches.clone();
        let mut agent = create_agent(0, 20, model);

        let tree = agent.search(&mut env, true).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_terminal());

        let action = agent.act(&mut env, true).unwrap();
        assert_eq!(action, Action::Discrete(0));
        assert!(agent.histories().is_empty());
        assert!(batches.borrow().is_empty());
    }

    #[test]
    fn test_inferred_value_without_history_is_snapshot() {
        let mut env = Ladder::new();
        let model = RecordingModel {
            prediction: 100.0,
            ..Default::default()
        };
        let mut agent = create_agent(5, 30, model);

        let tree = agent.search(&mut env, false).unwrap();
        for &child in tree.root().children() {
            let chance = tree.chance(child);
            assert!(chance.history().is_empty());
            assert_eq!(
                agent.inferred_value(&env, &tree, child).unwrap(),
                chance.snapshot_value().unwrap()
            );
        }
    }

    #[test]
    fn test_inferred_value_uses_model_with_history() {
        let mut env = Ladder::new();
        let model = RecordingModel {
            prediction: 100.0,
            ..Default::default()
        };
        let mut agent = create_agent(5, 30, model);

        agent.act(&mut env, false).unwrap();
        let tree = agent.search(&mut env, false).unwrap();

        // The root pairs were recorded by the first search
        for &child in tree.root().children() {
            assert!(!tree.chance(child).history().is_empty());
            assert_eq!(agent.inferred_value(&env, &tree, child).unwrap(), 100.0);
        }
    }

    #[test]
    fn test_inferred_value_unvisited_is_error() {
        let mut env = Ladder::new();
        let mut agent = create_agent(3, 1, EmpiricalModel);

        let tree = agent.search(&mut env, false).unwrap();
        let unexplored = tree.root().children()[1];
        assert_eq!(
            agent.inferred_value(&env, &tree, unexplored),
            Err(IquctError::Unvisited)
        );
    }

    #[test]
    fn test_extract_data_single_example() {
        let env = Ladder::new();
        let agent = create_agent(0, 1, EmpiricalModel);

        let mut tree = SearchTree::new(Rung { t: 1, prev: Some(0) }, false);
        tree.add_actions(
            NodeId::ROOT,
            vec![ChanceNode::new(
                NodeId::ROOT,
                0,
                Action::Discrete(1),
                vec![HistoryTuple::new(2, 0.5)],
            )],
        );
        let child = tree.root().children()[0];
        tree.chance_mut(child).sampled_returns.push(0.7);

        let data = agent.extract_data(&env, &tree);
        assert_eq!(
            data,
            vec![TrainingExample {
                action: Action::Discrete(1),
                features: vec![1.0, 0.0, 2.0, 0.5],
                target: 0.7,
            }]
        );
    }

    #[test]
    fn test_first_search_skips_model_update() {
        let mut env = Ladder::new();
        let model = RecordingModel::default();
        let batches = model.batches.clone();
        let mut agent = create_agent(9, 30, model);

        agent.act(&mut env, false).unwrap();
        assert!(batches.borrow().is_empty());

        // The second search finds histories and trains once
        agent.act(&mut env, false).unwrap();
        let batches = batches.borrow();
        assert_eq!(batches.len(), 1);
        assert!(!batches[0].is_empty());
        assert!(batches[0].iter().all(|ex| ex.features.len() == 4));
    }

    #[test]
    fn test_histories_grow_until_reset() {
        let mut env = Ladder::new();
        let model = RecordingModel::default();
        let resets = model.resets.clone();
        let mut agent = create_agent(21, 30, model);

        agent.act(&mut env, false).unwrap();
        let keys = agent.histories().len();
        let observations = agent.histories().observations();
        assert!(keys > 0);

        agent.act(&mut env, false).unwrap();
        assert!(agent.histories().len() >= keys);
        assert!(agent.histories().observations() > observations);

        agent.reset();
        assert!(agent.histories().is_empty());
        assert_eq!(*resets.borrow(), 1);
    }

    #[test]
    fn test_failed_model_update_leaves_histories() {
        let mut env = Ladder::new();
        let mut agent = create_agent(0, 30, FailingModel);

        // No history yet, so the model is not asked to train
        agent.act(&mut env, false).unwrap();
        let keys = agent.histories().len();
        let observations = agent.histories().observations();
        assert!(observations > 0);

        assert!(matches!(
            agent.act(&mut env, false),
            Err(IquctError::Model(_))
        ));
        assert_eq!(agent.histories().len(), keys);
        assert_eq!(agent.histories().observations(), observations);
    }

    #[test]
    fn test_deterministic() {
        let run = |seed: u64| {
            let mut env = Ladder::new();
            let mut agent = create_agent(seed, 25, EmpiricalModel);
            let action = agent.act(&mut env, false).unwrap();
            let tree = agent.search(&mut env, false).unwrap();
            let returns: Vec<Vec<f64>> = tree
                .root_children()
                .map(|c| c.sampled_returns().to_vec())
                .collect();
            (action, returns)
        };

        assert_eq!(run(12345), run(12345));
    }

    #[test]
    fn test_unsupported_action_space() {
        let mut env = Ladder::new();
        env.space = ActionSpace::Box {
            low: vec![0.0],
            high: vec![1.0],
        };
        let mut agent = create_agent(0, 5, EmpiricalModel);

        assert!(matches!(
            agent.act(&mut env, false),
            Err(IquctError::UnsupportedActionSpace(_))
        ));
    }

    #[test]
    fn test_empty_action_space() {
        let mut env = Ladder::new();
        env.space = ActionSpace::Discrete(0);
        let mut agent = create_agent(0, 5, EmpiricalModel);

        assert_eq!(agent.act(&mut env, false), Err(IquctError::EmptyActionSpace));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IqUctConfig {
            rollouts: 0,
            ..Default::default()
        };
        let policy = UniformPolicy::new(ChaCha8Rng::seed_from_u64(0));
        let agent: Result<Agent<EmpiricalModel>> =
            IqUct::new(config, EmpiricalModel, policy, ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(agent, Err(IquctError::InvalidConfig(_))));
    }
}
