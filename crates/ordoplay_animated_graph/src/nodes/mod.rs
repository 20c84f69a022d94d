// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node variants and their per-frame update.
//!
//! Updates are split in two steps so the arena is never borrowed mutably
//! while inputs are read: [`AnimatedNode::evaluate`] computes a
//! [`NodeUpdate`] from a read-only [`Lookup`], and the propagation pass then
//! applies it to the node.

mod arithmetic;
mod color;
mod interpolation;
mod object;
mod props;
mod style;
mod tracking;
mod transform;

pub use arithmetic::{ArithmeticNode, ArithmeticOp, DiffClampNode, ModulusNode, RoundNode};
pub use color::ColorNode;
pub use interpolation::{Extrapolation, InterpolationNode, OutputRange};
pub use object::ObjectNode;
pub use props::PropsNode;
pub use style::StyleNode;
pub use tracking::{AnimationRestart, TrackingNode};
pub use transform::{TransformEntry, TransformNode};

use crate::error::Result;
use crate::graph::Lookup;
use crate::node::{AnimatedNode, NodeKind};
use crate::value::PropValue;

/// Change produced by one node update
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeUpdate {
    /// Nothing to write
    Unchanged,
    /// New raw value
    Value(f64),
    /// New animated object
    Object(PropValue),
    /// New diff clamp value and input memory
    DiffClamp { value: f64, last_value: f64 },
    /// Restart of a tracked animation
    Restart(AnimationRestart),
}

impl AnimatedNode {
    /// Compute this node's update from its inputs
    pub(crate) fn evaluate(&self, lookup: &Lookup<'_>) -> Result<NodeUpdate> {
        let tag = self.tag;
        match &self.kind {
            NodeKind::Value
            | NodeKind::Color(_)
            | NodeKind::Style(_)
            | NodeKind::Props(_)
            | NodeKind::Transform(_)
            | NodeKind::Object(_) => Ok(NodeUpdate::Unchanged),
            NodeKind::Interpolation(node) => node.update(tag, lookup),
            NodeKind::Arithmetic(node) => Ok(node
                .update(tag, lookup)?
                .map_or(NodeUpdate::Unchanged, NodeUpdate::Value)),
            NodeKind::Modulus(node) => node.update(tag, lookup).map(NodeUpdate::Value),
            NodeKind::Round(node) => node.update(tag, lookup).map(NodeUpdate::Value),
            NodeKind::DiffClamp(node) => {
                let current = self.value.as_ref().map_or(0.0, |state| state.value);
                let (value, last_value) = node.update(tag, current, lookup)?;
                Ok(NodeUpdate::DiffClamp { value, last_value })
            }
            NodeKind::Tracking(node) => node.update(tag, lookup).map(NodeUpdate::Restart),
        }
    }

    /// Write an update computed by [`AnimatedNode::evaluate`].
    ///
    /// Returns the animation restart to schedule, if any.
    pub(crate) fn apply(&mut self, update: NodeUpdate) -> Option<AnimationRestart> {
        match update {
            NodeUpdate::Unchanged => None,
            NodeUpdate::Value(value) => {
                if let Some(state) = &mut self.value {
                    state.value = value;
                }
                None
            }
            NodeUpdate::Object(object) => {
                if let Some(state) = &mut self.value {
                    state.animated_object = Some(object);
                }
                None
            }
            NodeUpdate::DiffClamp { value, last_value } => {
                if let NodeKind::DiffClamp(node) = &mut self.kind {
                    node.last_value = last_value;
                }
                if let Some(state) = &mut self.value {
                    state.value = value;
                }
                None
            }
            NodeUpdate::Restart(restart) => Some(restart),
        }
    }
}
