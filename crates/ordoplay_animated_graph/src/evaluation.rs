// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame propagation.
//!
//! Propagation runs two breadth-first passes from a set of seed nodes. A
//! per-pass colour marks visited nodes so no reset loop is needed between
//! frames.
//!
//! 1. The counting pass visits everything reachable from the seeds and counts
//!    each node's active predecessors.
//! 2. The ordered pass starts from nodes without active predecessors, updates
//!    each node and releases a child once its last predecessor is done, which
//!    yields a topological order of the active subgraph.
//!
//! If the ordered pass updates fewer nodes than the counting pass found, the
//! graph has a cycle or a region unreachable in order. What happens then is
//! decided by the [`ConsistencyPolicy`].

use crate::error::{AnimatedError, Result};
use crate::graph::NodeGraph;
use crate::node::{NodeKind, NodeTag, INITIAL_BFS_COLOR};
use crate::nodes::AnimationRestart;
use crate::notify::PropsSink;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Reaction to a pass that could not order every active node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyPolicy {
    /// Fail the pass with [`AnimatedError::InconsistentGraph`]
    #[default]
    Strict,
    /// Log and carry on
    Lenient,
}

/// Counts of one propagation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassStats {
    /// Nodes reached by the counting pass
    pub active: usize,
    /// Nodes updated by the ordered pass
    pub updated: usize,
    /// Edges leading back into already updated nodes
    pub cycles: usize,
}

impl PassStats {
    /// Whether every active node was updated
    pub fn is_consistent(&self) -> bool {
        self.active == self.updated
    }
}

/// Result of [`Propagation::update_nodes`]
#[derive(Debug, Default)]
pub(crate) struct PassOutcome {
    /// Animations tracking nodes asked to (re)start
    pub restarts: Vec<AnimationRestart>,
    /// Pass counts
    pub stats: PassStats,
    /// Set when the pass was inconsistent under [`ConsistencyPolicy::Strict`]
    pub error: Option<AnimatedError>,
}

/// Colour counter and warning state shared by all passes of one manager
#[derive(Debug)]
pub(crate) struct Propagation {
    bfs_color: u32,
    warned_about_traversal: bool,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            bfs_color: INITIAL_BFS_COLOR,
            warned_about_traversal: false,
        }
    }
}

impl Propagation {
    fn next_color(&mut self) -> u32 {
        self.bfs_color = self.bfs_color.wrapping_add(1);
        if self.bfs_color == INITIAL_BFS_COLOR {
            self.bfs_color = self.bfs_color.wrapping_add(1);
        }
        self.bfs_color
    }

    /// Propagate from `seeds` through everything reachable from them
    pub fn update_nodes(
        &mut self,
        graph: &mut NodeGraph,
        seeds: &[NodeTag],
        sink: &mut dyn PropsSink,
        policy: ConsistencyPolicy,
    ) -> PassOutcome {
        let mut outcome = PassOutcome::default();
        let mut queue = VecDeque::new();
        let mut visited = Vec::new();

        // Counting pass
        let color = self.next_color();
        for tag in seeds {
            if let Some(node) = graph.node_mut(*tag) {
                if node.bfs_color != color {
                    node.bfs_color = color;
                    visited.push(*tag);
                    queue.push_back(*tag);
                }
            }
        }
        while let Some(tag) = queue.pop_front() {
            let children = graph
                .node(tag)
                .map(|node| node.children.clone())
                .unwrap_or_default();
            for child_tag in children {
                let Some(child) = graph.node_mut(child_tag) else {
                    continue;
                };
                child.active_incoming_nodes += 1;
                if child.bfs_color != color {
                    child.bfs_color = color;
                    visited.push(child_tag);
                    queue.push_back(child_tag);
                }
            }
        }
        outcome.stats.active = visited.len();

        // Ordered pass
        let color = self.next_color();
        for tag in seeds {
            if let Some(node) = graph.node_mut(*tag) {
                if node.active_incoming_nodes == 0 && node.bfs_color != color {
                    node.bfs_color = color;
                    outcome.stats.updated += 1;
                    queue.push_back(*tag);
                }
            }
        }
        while let Some(tag) = queue.pop_front() {
            if let Some(restart) = update_node(graph, tag, sink) {
                outcome.restarts.push(restart);
            }

            let children = graph
                .node(tag)
                .map(|node| node.children.clone())
                .unwrap_or_default();
            for child_tag in children {
                let Some(child) = graph.node_mut(child_tag) else {
                    continue;
                };
                child.active_incoming_nodes = child.active_incoming_nodes.saturating_sub(1);
                if child.bfs_color != color && child.active_incoming_nodes == 0 {
                    child.bfs_color = color;
                    outcome.stats.updated += 1;
                    queue.push_back(child_tag);
                } else if child.bfs_color == color {
                    outcome.stats.cycles += 1;
                }
            }
        }

        if outcome.stats.is_consistent() {
            self.warned_about_traversal = false;
            return outcome;
        }

        // Nodes left waiting on a cycle would start the next pass with a
        // non-zero counter
        for tag in &visited {
            if let Some(node) = graph.node_mut(*tag) {
                node.active_incoming_nodes = 0;
            }
        }

        // Reported once until a consistent pass clears the flag
        if self.warned_about_traversal {
            return outcome;
        }
        self.warned_about_traversal = true;

        let error = AnimatedError::InconsistentGraph {
            active: outcome.stats.active,
            updated: outcome.stats.updated,
            cycles: outcome.stats.cycles,
        };
        tracing::error!("{}\n{}", error, graph.dump());
        match policy {
            ConsistencyPolicy::Strict => outcome.error = Some(error),
            ConsistencyPolicy::Lenient => tracing::warn!("Continuing after inconsistent pass: {}", error),
        }
        outcome
    }
}

/// Update one node, push props to views and notify its value listener
fn update_node(graph: &mut NodeGraph, tag: NodeTag, sink: &mut dyn PropsSink) -> Option<AnimationRestart> {
    let evaluated = graph.node(tag).map(|node| node.evaluate(&graph.lookup()))?;
    let restart = match evaluated {
        Ok(update) => graph.node_mut(tag).and_then(|node| node.apply(update)),
        Err(e) => {
            log_update_error(tag, &e);
            None
        }
    };

    update_view(graph, tag, sink);

    if let Some(state) = graph.node_mut(tag).and_then(|node| node.value.as_mut()) {
        let value = state.get_value();
        if let Some(listener) = state.listener.as_mut() {
            listener(value);
        }
    }
    restart
}

/// Apply a props node's current props to its views
fn update_view(graph: &mut NodeGraph, tag: NodeTag, sink: &mut dyn PropsSink) {
    let collected = match graph.node(tag) {
        Some(node) => match &node.kind {
            NodeKind::Props(props) if props.has_views() => props
                .collect(tag, &graph.lookup())
                .map(|map| (map, props.views().collect::<Vec<_>>())),
            _ => return,
        },
        None => return,
    };

    match collected {
        Ok((props, views)) => {
            for view in views {
                if let Err(e) = sink.apply_props(view, &props) {
                    log_update_error(tag, &AnimatedError::from(e));
                }
            }
            if let Some(NodeKind::Props(node)) = graph.node_mut(tag).map(|node| &mut node.kind) {
                node.set_last_props(props);
            }
        }
        Err(e) => log_update_error(tag, &e),
    }
}

/// Errors inside a pass never abort it
fn log_update_error(tag: NodeTag, error: &AnimatedError) {
    if error.is_transient() {
        tracing::warn!("Frame lost while updating animated node [{}]: {}", tag, error);
    } else {
        tracing::error!("Failed to update animated node [{}]: {}", tag, error);
    }
}

/// Take the error a strict pass left in its outcome
pub(crate) fn check(outcome: &mut PassOutcome) -> Result<()> {
    match outcome.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::node::{AnimatedNode, ViewTag};
    use crate::value::PropMap;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Recorder(Vec<(ViewTag, PropMap)>);

    impl PropsSink for Recorder {
        fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> std::result::Result<(), SinkError> {
            self.0.push((view, props.clone()));
            Ok(())
        }
    }

    fn add(graph: &mut NodeGraph, tag: i32, config: Value) {
        graph
            .add_node(AnimatedNode::from_config(NodeTag(tag), &config).unwrap())
            .unwrap();
    }

    fn value(graph: &NodeGraph, tag: i32) -> f64 {
        graph.value(NodeTag(tag)).unwrap()
    }

    /// 1 -> 3 <- 2, 3 -> 4, 1 -> 4
    fn diamond() -> NodeGraph {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 1.0}));
        add(&mut graph, 2, json!({"type": "value", "value": 2.0}));
        add(&mut graph, 3, json!({"type": "addition", "input": [1, 2]}));
        add(&mut graph, 4, json!({"type": "multiplication", "input": [3, 1]}));
        for (parent, child) in [(1, 3), (2, 3), (3, 4), (1, 4)] {
            graph.connect(NodeTag(parent), NodeTag(child)).unwrap();
        }
        graph
    }

    #[test]
    fn test_updates_in_dependency_order() {
        let mut graph = diamond();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        graph.node_mut(NodeTag(1)).unwrap().value.as_mut().unwrap().value = 5.0;
        let outcome = propagation.update_nodes(
            &mut graph,
            &[NodeTag(1), NodeTag(2)],
            &mut sink,
            ConsistencyPolicy::Strict,
        );

        assert!(outcome.error.is_none());
        assert_eq!(outcome.stats, PassStats { active: 4, updated: 4, cycles: 0 });
        assert_eq!(value(&graph, 3), 7.0);
        assert_eq!(value(&graph, 4), 35.0);
        assert!(graph.nodes().all(|node| node.active_incoming_nodes == 0));
    }

    #[test]
    fn test_each_node_updated_once() {
        let mut graph = diamond();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        for tag in 1..=4 {
            let seen = std::sync::Arc::clone(&seen);
            graph
                .node_mut(NodeTag(tag))
                .unwrap()
                .value
                .as_mut()
                .unwrap()
                .listener = Some(Box::new(move |_| seen.lock().push(tag)));
        }

        propagation.update_nodes(
            &mut graph,
            &[NodeTag(1), NodeTag(2), NodeTag(1)],
            &mut sink,
            ConsistencyPolicy::Strict,
        );
        let seen = seen.lock().clone();
        assert_eq!(seen.len(), 4);
        let position = |tag| seen.iter().position(|t| *t == tag).unwrap();
        assert!(position(3) > position(1) && position(3) > position(2));
        assert!(position(4) > position(3));
    }

    #[test]
    fn test_cycle_is_reported_under_strict_policy() {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 1.0}));
        add(&mut graph, 2, json!({"type": "addition", "input": [1, 3]}));
        add(&mut graph, 3, json!({"type": "addition", "input": [2]}));
        for (parent, child) in [(1, 2), (2, 3), (3, 2)] {
            graph.connect(NodeTag(parent), NodeTag(child)).unwrap();
        }
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        let mut outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        assert!(matches!(
            check(&mut outcome),
            Err(AnimatedError::InconsistentGraph { active: 3, updated: 1, .. })
        ));
        assert!(graph.nodes().all(|node| node.active_incoming_nodes == 0));
        assert!(propagation.warned_about_traversal);
    }

    #[test]
    fn test_repeated_cycle_reported_once() {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 1.0}));
        add(&mut graph, 2, json!({"type": "value", "value": 1.0}));
        graph.connect(NodeTag(1), NodeTag(2)).unwrap();
        graph.connect(NodeTag(2), NodeTag(1)).unwrap();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        let errors = (0..10)
            .filter(|_| {
                let outcome = propagation.update_nodes(
                    &mut graph,
                    &[NodeTag(1)],
                    &mut sink,
                    ConsistencyPolicy::Strict,
                );
                assert!(!outcome.stats.is_consistent());
                outcome.error.is_some()
            })
            .count();
        assert_eq!(errors, 1);

        // A consistent pass re-arms the report
        graph.disconnect(NodeTag(2), NodeTag(1)).unwrap();
        propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        graph.connect(NodeTag(2), NodeTag(1)).unwrap();
        let outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_cycle_is_logged_under_lenient_policy() {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 1.0}));
        add(&mut graph, 2, json!({"type": "value", "value": 1.0}));
        graph.connect(NodeTag(1), NodeTag(2)).unwrap();
        graph.connect(NodeTag(2), NodeTag(1)).unwrap();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        let outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Lenient);
        assert!(outcome.error.is_none());
        assert!(!outcome.stats.is_consistent());

        // Recovers once the cycle is gone
        graph.disconnect(NodeTag(2), NodeTag(1)).unwrap();
        let outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Lenient);
        assert!(outcome.stats.is_consistent());
        assert!(!propagation.warned_about_traversal);
    }

    #[test]
    fn test_props_reach_connected_views() {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 0.5}));
        add(&mut graph, 2, json!({"type": "style", "style": {"opacity": 1}}));
        add(&mut graph, 3, json!({"type": "props", "props": {"style": 2}}));
        graph.connect(NodeTag(1), NodeTag(2)).unwrap();
        graph.connect(NodeTag(2), NodeTag(3)).unwrap();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        // Not connected to a view: nothing applied
        propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        assert!(sink.0.is_empty());

        if let NodeKind::Props(props) = &mut graph.node_mut(NodeTag(3)).unwrap().kind {
            props.connect_view(ViewTag(11));
        }
        propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].0, ViewTag(11));
        assert_eq!(sink.0[0].1["opacity"].as_f64(), Some(0.5));
    }

    #[test]
    fn test_failed_update_does_not_stop_pass() {
        let mut graph = NodeGraph::new();
        add(&mut graph, 1, json!({"type": "value", "value": 0.0}));
        add(&mut graph, 2, json!({"type": "division", "input": [1, 1]}));
        add(&mut graph, 3, json!({"type": "addition", "input": [1]}));
        graph.connect(NodeTag(1), NodeTag(2)).unwrap();
        graph.connect(NodeTag(2), NodeTag(3)).unwrap();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();

        let outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(1)], &mut sink, ConsistencyPolicy::Strict);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.stats.updated, 3);
        assert_eq!(value(&graph, 3), 0.0);
    }

    #[test]
    fn test_unknown_seed_is_skipped() {
        let mut graph = diamond();
        let mut propagation = Propagation::default();
        let mut sink = Recorder::default();
        let outcome =
            propagation.update_nodes(&mut graph, &[NodeTag(99)], &mut sink, ConsistencyPolicy::Strict);
        assert_eq!(outcome.stats, PassStats::default());
    }
}
