// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the animated graph.

use crate::node::{NodeTag, NodeType, ViewTag};
use ordoplay_animated_drivers::DriverError;

/// Error raised by a graph command or during propagation
#[derive(Debug, thiserror::Error)]
pub enum AnimatedError {
    /// A node with this tag already exists
    #[error("Animated node [{0}] already exists")]
    NodeAlreadyExists(NodeTag),

    /// No node with this tag
    #[error("Animated node [{0}] does not exist")]
    NodeNotFound(NodeTag),

    /// Node config has no string `type` field
    #[error("Animated node config is missing a \"type\" field")]
    MissingNodeType,

    /// Unknown node type name
    #[error("Unsupported node type: {0}")]
    UnsupportedNodeType(String),

    /// Interpolation ranges are malformed
    #[error("Invalid interpolation config: {0}")]
    InvalidInterpolation(&'static str),

    /// Node config fields could not be read
    #[error("Invalid {node_type} node config: {source}")]
    InvalidNodeConfig {
        /// Node type being configured
        node_type: NodeType,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },

    /// A numeric node parameter would make every update NaN
    #[error("Invalid {node_type} node {field} {value}: must be finite and non-zero")]
    InvalidNodeParameter {
        /// Node type being configured
        node_type: NodeType,
        /// Config field
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// The node exists but has the wrong kind for this command
    #[error("Animated node [{tag}] should be of type {expected}, found {found}")]
    WrongNodeType {
        /// Node addressed by the command
        tag: NodeTag,
        /// Kind the command needs
        expected: &'static str,
        /// Kind the node has
        found: NodeType,
    },

    /// The view is not connected to this props node
    #[error("View [{view}] is not connected to animated node [{tag}]")]
    ViewNotConnected {
        /// Props node
        tag: NodeTag,
        /// View addressed by the command
        view: ViewTag,
    },

    /// An input tag does not resolve to a value-like node
    #[error("Illegal node [{input}] used as input for animated node [{tag}]")]
    IllegalInput {
        /// Node reading the input
        tag: NodeTag,
        /// Offending input
        input: NodeTag,
    },

    /// A style, props or object node maps to a node it cannot read
    #[error("Unsupported type of node [{input}] used in property node [{tag}]")]
    UnsupportedMappedNode {
        /// Aggregating node
        tag: NodeTag,
        /// Offending mapped node
        input: NodeTag,
    },

    /// Division node received a zero divisor
    #[error("Detected a division by zero in animated node [{0}]")]
    DivisionByZero(NodeTag),

    /// Lazy value resolution went too deep
    #[error("Value of animated node [{0}] could not be resolved: input chain too deep")]
    ResolveDepth(NodeTag),

    /// Event payload did not match a binding's path
    #[error("Event {event} has no numeric value at path {path:?}")]
    EventPath {
        /// Event name
        event: String,
        /// Path of the binding
        path: Vec<String>,
    },

    /// Event mapping config could not be read
    #[error("Invalid event mapping: {0}")]
    InvalidEventMapping(#[source] serde_json::Error),

    /// Propagation visited a different number of nodes in its two passes
    #[error(
        "Looks like animated nodes graph has cycles or disconnected regions: \
         {active} nodes found, {updated} nodes updated, {cycles} cycles detected"
    )]
    InconsistentGraph {
        /// Nodes reached in the counting pass
        active: usize,
        /// Nodes updated in the ordered pass
        updated: usize,
        /// Back edges seen in the ordered pass
        cycles: usize,
    },

    /// Driver config error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Props sink error
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl AnimatedError {
    /// Whether the error is expected while the host is still setting up
    /// (node or view not created yet) and should only be warned about
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_) | Self::Sink(SinkError::ViewNotFound(_))
        )
    }
}

/// Error reported by a props sink
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The target view is not mounted (yet)
    #[error("View [{0}] does not exist")]
    ViewNotFound(ViewTag),

    /// The sink refused the props
    #[error("View [{view}] rejected props: {reason}")]
    Rejected {
        /// Target view
        view: ViewTag,
        /// Sink-specific reason
        reason: String,
    },
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, AnimatedError>;
