// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animated node graph for `OrdoPlay` Animated.
//!
//! Hosts describe animations as a graph of small nodes: values, operators,
//! interpolations and aggregates that end in props applied to views. The
//! [`AnimatedNodesManager`] keeps the graph, steps animation drivers once per
//! frame and pushes the resulting props through a [`PropsSink`].
//!
//! ## Architecture
//!
//! - [`graph`]: arena of nodes keyed by tag, edges stored as child tags
//! - [`nodes`]: per-variant update logic
//! - [`evaluation`]: two-pass breadth-first propagation with cycle detection
//! - [`binding`]: view events copied into value nodes
//! - [`notify`]: callbacks and host events for results produced later
//!
//! ```
//! use ordoplay_animated_graph::{AnimatedNodesManager, NodeTag, NoopEmitter, NoopSink};
//! use serde_json::json;
//!
//! let mut manager = AnimatedNodesManager::new(NoopSink, NoopEmitter);
//! manager.create_animated_node(NodeTag(1), &json!({"type": "value", "value": 5.0})).unwrap();
//! manager.create_animated_node(NodeTag(2), &json!({"type": "value", "value": 10.0})).unwrap();
//! manager.create_animated_node(NodeTag(3), &json!({"type": "addition", "input": [1, 2]})).unwrap();
//! manager.connect_animated_nodes(NodeTag(1), NodeTag(3)).unwrap();
//! manager.connect_animated_nodes(NodeTag(2), NodeTag(3)).unwrap();
//! manager.run_updates(0).unwrap();
//! assert_eq!(manager.value_of(NodeTag(3)).unwrap(), 15.0);
//! ```

pub mod binding;
pub mod driver;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod manager;
pub mod node;
pub mod nodes;
pub mod notify;
pub mod value;

pub use binding::{normalize_event_name, AnimatedEvent, EventBinding, EventBindings, EventMapping};
pub use driver::{AnimationDriver, AnimationId};
pub use error::{AnimatedError, Result, SinkError};
pub use evaluation::{ConsistencyPolicy, PassStats};
pub use graph::{Lookup, NodeGraph};
pub use manager::AnimatedNodesManager;
pub use node::{AnimatedNode, NodeKind, NodeTag, NodeType, ValueState, ViewTag};
pub use notify::{
    AnimationEnd, AnimationEndChannel, EndCallback, HostEvent, HostEventEmitter, NoopEmitter,
    NoopSink, PropsSink, ValueCallback, ValueListener, ValueReply,
};
pub use value::{PropMap, PropValue};
