// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animated node definitions.

use crate::error::{AnimatedError, Result};
use crate::notify::ValueListener;
use crate::nodes::{
    ArithmeticNode, ArithmeticOp, ColorNode, DiffClampNode, InterpolationNode, ModulusNode,
    ObjectNode, PropsNode, RoundNode, StyleNode, TrackingNode, TransformNode,
};
use crate::value::PropValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Host-assigned identifier of an animated node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTag(pub i32);

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned identifier of a view receiving props
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewTag(pub i32);

impl fmt::Display for ViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node kind, keyed by the config's `type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Style aggregator
    Style,
    /// Plain numeric value
    Value,
    /// RGBA color from four value nodes
    Color,
    /// Props aggregator bound to views
    Props,
    /// Range mapping of its parent value
    Interpolation,
    /// Sum of inputs
    Addition,
    /// First input minus the rest
    Subtraction,
    /// First input divided by the rest
    Division,
    /// Product of inputs
    Multiplication,
    /// Positive remainder
    Modulus,
    /// Clamped accumulation of input deltas
    DiffClamp,
    /// Snap to a multiple
    Round,
    /// Transform list
    Transform,
    /// Restarts an animation towards another node's value
    Tracking,
    /// Template with node values substituted
    Object,
}

impl NodeType {
    /// Look up a node type by its config name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "style" => Self::Style,
            "value" => Self::Value,
            "color" => Self::Color,
            "props" => Self::Props,
            "interpolation" => Self::Interpolation,
            "addition" => Self::Addition,
            "subtraction" => Self::Subtraction,
            "division" => Self::Division,
            "multiplication" => Self::Multiplication,
            "modulus" => Self::Modulus,
            "diffclamp" => Self::DiffClamp,
            "round" => Self::Round,
            "transform" => Self::Transform,
            "tracking" => Self::Tracking,
            "object" => Self::Object,
            _ => return None,
        })
    }

    /// Config name of this node type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Value => "value",
            Self::Color => "color",
            Self::Props => "props",
            Self::Interpolation => "interpolation",
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Division => "division",
            Self::Multiplication => "multiplication",
            Self::Modulus => "modulus",
            Self::DiffClamp => "diffclamp",
            Self::Round => "round",
            Self::Transform => "transform",
            Self::Tracking => "tracking",
            Self::Object => "object",
        }
    }

    /// Whether nodes of this type carry a numeric value
    pub fn is_value_like(&self) -> bool {
        matches!(
            self,
            Self::Value
                | Self::Interpolation
                | Self::Addition
                | Self::Subtraction
                | Self::Division
                | Self::Multiplication
                | Self::Modulus
                | Self::DiffClamp
                | Self::Round
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric state of value-like nodes.
///
/// The effective value is `value + offset`. Computed nodes start with a NaN
/// value and are resolved lazily when read before their first update.
pub struct ValueState {
    /// Raw value, written by drivers, events and `set_value`
    pub value: f64,
    /// Offset added on read
    pub offset: f64,
    /// Non-numeric output (interpolated color or string)
    pub animated_object: Option<PropValue>,
    pub(crate) listener: Option<ValueListener>,
}

impl ValueState {
    /// State with a raw value and zero offset
    pub fn new(value: f64) -> Self {
        Self {
            value,
            offset: 0.0,
            animated_object: None,
            listener: None,
        }
    }

    /// State of a computed node that has not been updated yet
    pub fn uncomputed() -> Self {
        Self::new(f64::NAN)
    }

    /// Effective value
    pub fn get_value(&self) -> f64 {
        self.value + self.offset
    }

    /// Merge the offset into the value
    pub fn flatten_offset(&mut self) {
        self.value += self.offset;
        self.offset = 0.0;
    }

    /// Move the value into the offset
    pub fn extract_offset(&mut self) {
        self.offset += self.value;
        self.value = 0.0;
    }

    /// Prop representation: the animated object if any, else the value
    pub fn to_prop(&self) -> PropValue {
        self.animated_object
            .clone()
            .unwrap_or_else(|| PropValue::Number(self.get_value()))
    }

    /// Whether a value listener is installed
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl fmt::Debug for ValueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueState")
            .field("value", &self.value)
            .field("offset", &self.offset)
            .field("animated_object", &self.animated_object)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ValueConfig {
    #[serde(default)]
    value: f64,
    #[serde(default)]
    offset: f64,
}

/// Variant payload of a node
#[derive(Debug)]
pub enum NodeKind {
    /// Plain value
    Value,
    /// Interpolation
    Interpolation(InterpolationNode),
    /// Addition, subtraction, multiplication or division
    Arithmetic(ArithmeticNode),
    /// Modulus
    Modulus(ModulusNode),
    /// Diff clamp
    DiffClamp(DiffClampNode),
    /// Round
    Round(RoundNode),
    /// Color
    Color(ColorNode),
    /// Style
    Style(StyleNode),
    /// Props
    Props(PropsNode),
    /// Transform
    Transform(TransformNode),
    /// Tracking
    Tracking(TrackingNode),
    /// Object
    Object(ObjectNode),
}

impl NodeKind {
    /// Node type of this payload
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Value => NodeType::Value,
            Self::Interpolation(_) => NodeType::Interpolation,
            Self::Arithmetic(node) => node.op.node_type(),
            Self::Modulus(_) => NodeType::Modulus,
            Self::DiffClamp(_) => NodeType::DiffClamp,
            Self::Round(_) => NodeType::Round,
            Self::Color(_) => NodeType::Color,
            Self::Style(_) => NodeType::Style,
            Self::Props(_) => NodeType::Props,
            Self::Transform(_) => NodeType::Transform,
            Self::Tracking(_) => NodeType::Tracking,
            Self::Object(_) => NodeType::Object,
        }
    }
}

/// A vertex of the animated graph
#[derive(Debug)]
pub struct AnimatedNode {
    /// Host-assigned tag
    pub tag: NodeTag,
    /// Tags of nodes fed by this one, without duplicates
    pub(crate) children: Vec<NodeTag>,
    /// Colour of the last traversal that visited this node
    pub(crate) bfs_color: u32,
    /// Predecessors still to be updated in the current pass
    pub(crate) active_incoming_nodes: u32,
    /// Numeric state, present on value-like nodes
    pub value: Option<ValueState>,
    /// Variant payload
    pub kind: NodeKind,
}

/// Traversal colour no pass ever uses
pub(crate) const INITIAL_BFS_COLOR: u32 = 0;

impl AnimatedNode {
    /// Build a node from a host config map with a `"type"` field
    pub fn from_config(tag: NodeTag, config: &Value) -> Result<Self> {
        let type_name = config
            .get("type")
            .and_then(Value::as_str)
            .ok_or(AnimatedError::MissingNodeType)?;
        let node_type = NodeType::from_name(type_name)
            .ok_or_else(|| AnimatedError::UnsupportedNodeType(type_name.to_string()))?;

        let (kind, value) = match node_type {
            NodeType::Value => {
                let config: ValueConfig = decode(node_type, config)?;
                let mut state = ValueState::new(config.value);
                state.offset = config.offset;
                (NodeKind::Value, Some(state))
            }
            NodeType::Interpolation => (
                NodeKind::Interpolation(InterpolationNode::from_config(config)?),
                Some(ValueState::uncomputed()),
            ),
            NodeType::Addition
            | NodeType::Subtraction
            | NodeType::Division
            | NodeType::Multiplication => {
                let op = ArithmeticOp::from_node_type(node_type)
                    .ok_or_else(|| AnimatedError::UnsupportedNodeType(type_name.to_string()))?;
                (
                    NodeKind::Arithmetic(ArithmeticNode::new(op, decode(node_type, config)?)),
                    Some(ValueState::uncomputed()),
                )
            }
            NodeType::Modulus => (
                NodeKind::Modulus(ModulusNode::from_config(decode(node_type, config)?)?),
                Some(ValueState::uncomputed()),
            ),
            NodeType::DiffClamp => {
                let node = DiffClampNode::from_config(decode(node_type, config)?);
                let state = ValueState::new(node.initial_value());
                (NodeKind::DiffClamp(node), Some(state))
            }
            NodeType::Round => (
                NodeKind::Round(RoundNode::from_config(decode(node_type, config)?)?),
                Some(ValueState::uncomputed()),
            ),
            NodeType::Color => (NodeKind::Color(decode(node_type, config)?), None),
            NodeType::Style => (NodeKind::Style(decode(node_type, config)?), None),
            NodeType::Props => (NodeKind::Props(PropsNode::from_config(config)?), None),
            NodeType::Transform => (NodeKind::Transform(decode(node_type, config)?), None),
            NodeType::Tracking => (NodeKind::Tracking(decode(node_type, config)?), None),
            NodeType::Object => (NodeKind::Object(decode(node_type, config)?), None),
        };

        Ok(Self {
            tag,
            children: Vec::new(),
            bfs_color: INITIAL_BFS_COLOR,
            active_incoming_nodes: 0,
            value,
            kind,
        })
    }

    /// Node type
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Tags of nodes fed by this one
    pub fn children(&self) -> &[NodeTag] {
        &self.children
    }

    /// Numeric state, or a type error naming `tag`
    pub fn value_state(&self) -> Result<&ValueState> {
        self.value.as_ref().ok_or(AnimatedError::WrongNodeType {
            tag: self.tag,
            expected: "value",
            found: self.node_type(),
        })
    }

    /// Mutable numeric state, or a type error naming `tag`
    pub fn value_state_mut(&mut self) -> Result<&mut ValueState> {
        let (tag, found) = (self.tag, self.node_type());
        self.value.as_mut().ok_or(AnimatedError::WrongNodeType {
            tag,
            expected: "value",
            found,
        })
    }

    /// Called when `parent` starts feeding this node
    pub(crate) fn on_attached_to_node(&mut self, parent: NodeTag, parent_is_value: bool) -> Result<()> {
        if let NodeKind::Interpolation(interpolation) = &mut self.kind {
            let taken = interpolation.parent.is_some_and(|current| current != parent);
            if !parent_is_value || taken {
                return Err(AnimatedError::IllegalInput {
                    tag: self.tag,
                    input: parent,
                });
            }
            interpolation.parent = Some(parent);
        }
        Ok(())
    }

    /// Called when `parent` stops feeding this node
    pub(crate) fn on_detached_from_node(&mut self, parent: NodeTag) {
        if let NodeKind::Interpolation(interpolation) = &mut self.kind {
            if interpolation.parent == Some(parent) {
                interpolation.parent = None;
            }
        }
    }

    /// Replace the config of nodes that support it; returns whether it did
    pub(crate) fn update_config(&mut self, config: &Value) -> Result<bool> {
        match &mut self.kind {
            NodeKind::Interpolation(interpolation) => {
                let parent = interpolation.parent;
                *interpolation = InterpolationNode::from_config(config)?;
                interpolation.parent = parent;
                Ok(true)
            }
            NodeKind::Object(object) => {
                *object = decode(NodeType::Object, config)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// One-line description for graph dumps
    pub fn pretty_print(&self) -> String {
        let mut out = format!("{}[{}]", self.node_type(), self.tag);
        if let Some(state) = &self.value {
            out.push_str(&format!(" value: {} offset: {}", state.value, state.offset));
            if let Some(object) = &state.animated_object {
                out.push_str(&format!(" object: {object:?}"));
            }
        }
        match &self.kind {
            NodeKind::Interpolation(node) => {
                out.push_str(&format!(" parent: {:?}", node.parent.map(|p| p.0)));
            }
            NodeKind::Arithmetic(node) => out.push_str(&format!(" input: {:?}", node.input)),
            NodeKind::Props(node) => {
                out.push_str(&format!(" views: {:?}", node.views().collect::<Vec<_>>()));
            }
            _ => {}
        }
        out.push_str(&format!(
            " children: {:?}",
            self.children.iter().map(|c| c.0).collect::<Vec<_>>()
        ));
        out
    }
}

/// Decode a node config into its typed form
pub(crate) fn decode<T: DeserializeOwned>(node_type: NodeType, config: &Value) -> Result<T> {
    T::deserialize(config).map_err(|source| AnimatedError::InvalidNodeConfig { node_type, source })
}
