// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node arena and edges.

use crate::error::{AnimatedError, Result};
use crate::node::{AnimatedNode, NodeKind, NodeTag};
use crate::nodes::NodeUpdate;
use crate::value::PropValue;
use indexmap::IndexMap;

/// Deepest chain of uncomputed nodes resolved on read
const MAX_RESOLVE_DEPTH: usize = 64;

/// Arena of animated nodes keyed by tag.
///
/// Edges are stored on the parent as child tags. The graph does not reject
/// cycles; propagation detects them.
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: IndexMap<NodeTag, AnimatedNode>,
}

impl NodeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; fails if the tag is taken
    pub fn add_node(&mut self, node: AnimatedNode) -> Result<()> {
        if self.nodes.contains_key(&node.tag) {
            return Err(AnimatedError::NodeAlreadyExists(node.tag));
        }
        self.nodes.insert(node.tag, node);
        Ok(())
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, tag: NodeTag) -> Option<AnimatedNode> {
        let node = self.nodes.shift_remove(&tag)?;
        for other in self.nodes.values_mut() {
            other.children.retain(|child| *child != tag);
        }
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.on_detached_from_node(tag);
            }
        }
        Some(node)
    }

    /// Get a node by tag
    pub fn node(&self, tag: NodeTag) -> Option<&AnimatedNode> {
        self.nodes.get(&tag)
    }

    /// Get a mutable node by tag
    pub fn node_mut(&mut self, tag: NodeTag) -> Option<&mut AnimatedNode> {
        self.nodes.get_mut(&tag)
    }

    /// Get a node or fail with [`AnimatedError::NodeNotFound`]
    pub fn require(&self, tag: NodeTag) -> Result<&AnimatedNode> {
        self.node(tag).ok_or(AnimatedError::NodeNotFound(tag))
    }

    /// Get a mutable node or fail with [`AnimatedError::NodeNotFound`]
    pub fn require_mut(&mut self, tag: NodeTag) -> Result<&mut AnimatedNode> {
        self.node_mut(tag).ok_or(AnimatedError::NodeNotFound(tag))
    }

    /// Whether a node with this tag exists
    pub fn contains(&self, tag: NodeTag) -> bool {
        self.nodes.contains_key(&tag)
    }

    /// All nodes, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &AnimatedNode> {
        self.nodes.values()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an edge `parent -> child`; an existing edge is kept as is
    pub fn connect(&mut self, parent: NodeTag, child: NodeTag) -> Result<()> {
        let parent_is_value = self.require(parent)?.value.is_some();
        self.require_mut(child)?
            .on_attached_to_node(parent, parent_is_value)?;

        let parent = self.require_mut(parent)?;
        if !parent.children.contains(&child) {
            parent.children.push(child);
        }
        Ok(())
    }

    /// Remove the edge `parent -> child` if present
    pub fn disconnect(&mut self, parent: NodeTag, child: NodeTag) -> Result<()> {
        self.require(child)?;
        self.require_mut(parent)?.children.retain(|c| *c != child);
        self.require_mut(child)?.on_detached_from_node(parent);
        Ok(())
    }

    /// Read-only view used to evaluate nodes
    pub fn lookup(&self) -> Lookup<'_> {
        Lookup {
            graph: self,
            depth: 0,
        }
    }

    /// Effective value of a value-like node, resolved on read if needed
    pub fn value(&self, tag: NodeTag) -> Result<f64> {
        let node = self.require(tag)?;
        node.value_state()?;
        self.lookup().value(tag, tag)
    }

    /// Multi-line dump of every node, for diagnostics
    pub fn dump(&self) -> String {
        self.nodes
            .values()
            .map(AnimatedNode::pretty_print)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Read-only access to the graph while a node computes its update.
///
/// Reading a computed node that was never updated evaluates it on the spot,
/// without storing the result.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    graph: &'a NodeGraph,
    depth: usize,
}

impl<'a> Lookup<'a> {
    /// Node by tag
    pub fn node(&self, tag: NodeTag) -> Result<&'a AnimatedNode> {
        self.graph.require(tag)
    }

    fn deeper(&self, tag: NodeTag) -> Result<Self> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            return Err(AnimatedError::ResolveDepth(tag));
        }
        Ok(Self {
            graph: self.graph,
            depth: self.depth + 1,
        })
    }

    /// Effective value of `input`, read on behalf of `requester`
    pub fn value(&self, requester: NodeTag, input: NodeTag) -> Result<f64> {
        let node = self.node(input)?;
        let state = node.value.as_ref().ok_or(AnimatedError::IllegalInput {
            tag: requester,
            input,
        })?;
        let current = state.get_value();
        if !current.is_nan() {
            return Ok(current);
        }
        match self.deeper(input)?.resolve(node)? {
            Some(PropValue::Number(value)) => Ok(value),
            _ => Ok(current),
        }
    }

    /// Prop of a value-like `input`: its animated object or its value
    pub fn value_prop(&self, requester: NodeTag, input: NodeTag) -> Result<PropValue> {
        let node = self.node(input)?;
        let state = node.value.as_ref().ok_or(AnimatedError::IllegalInput {
            tag: requester,
            input,
        })?;
        if state.animated_object.is_some() || !state.get_value().is_nan() {
            return Ok(state.to_prop());
        }
        Ok(self
            .deeper(input)?
            .resolve(node)?
            .unwrap_or_else(|| state.to_prop()))
    }

    /// Prop of any node a style, props or object node may map to
    pub fn prop(&self, requester: NodeTag, input: NodeTag) -> Result<PropValue> {
        let node = self.node(input)?;
        if node.value.is_some() {
            return self.value_prop(requester, input);
        }
        match &node.kind {
            NodeKind::Color(color) => color.argb(input, &self.deeper(input)?).map(PropValue::Color),
            NodeKind::Transform(transform) => transform.collect(input, &self.deeper(input)?),
            NodeKind::Object(object) => object.collect(input, &self.deeper(input)?),
            _ => Err(AnimatedError::UnsupportedMappedNode {
                tag: requester,
                input,
            }),
        }
    }

    /// Evaluate an uncomputed node without storing the result
    fn resolve(&self, node: &AnimatedNode) -> Result<Option<PropValue>> {
        let offset = node.value.as_ref().map_or(0.0, |state| state.offset);
        Ok(match node.evaluate(self)? {
            NodeUpdate::Value(value) | NodeUpdate::DiffClamp { value, .. } => {
                Some(PropValue::Number(value + offset))
            }
            NodeUpdate::Object(object) => Some(object),
            NodeUpdate::Unchanged | NodeUpdate::Restart(_) => None,
        })
    }
}
