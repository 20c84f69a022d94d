// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable graph commands.
//!
//! Every manager operation that does not need a closure has a [`Command`]
//! form, so it can be queued to the render thread or stored in a replay
//! script. Results are reported through the host event emitter.

use ordoplay_animated_graph::{
    AnimatedNodesManager, AnimationEndChannel, AnimationId, NodeTag, Result, ValueReply, ViewTag,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One manager operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Create a node from a config map
    CreateNode {
        /// Node tag
        tag: NodeTag,
        /// Config map with a `type` field
        config: Value,
    },
    /// Replace the config of an interpolation or object node
    UpdateNodeConfig {
        /// Node tag
        tag: NodeTag,
        /// New config map
        config: Value,
    },
    /// Drop a node
    DropNode {
        /// Node tag
        tag: NodeTag,
    },
    /// Add an edge
    ConnectNodes {
        /// Feeding node
        parent: NodeTag,
        /// Fed node
        child: NodeTag,
    },
    /// Remove an edge
    DisconnectNodes {
        /// Feeding node
        parent: NodeTag,
        /// Fed node
        child: NodeTag,
    },
    /// Start applying a props node to a view
    ConnectNodeToView {
        /// Props node
        tag: NodeTag,
        /// View
        view: ViewTag,
    },
    /// Stop applying a props node to a view
    DisconnectNodeFromView {
        /// Props node
        tag: NodeTag,
        /// View
        view: ViewTag,
    },
    /// Null every prop a props node last applied
    RestoreDefaultValues {
        /// Props node
        tag: NodeTag,
    },
    /// Overwrite a raw value
    SetValue {
        /// Value node
        tag: NodeTag,
        /// New raw value
        value: f64,
    },
    /// Overwrite an offset
    SetOffset {
        /// Value node
        tag: NodeTag,
        /// New offset
        offset: f64,
    },
    /// Merge the offset into the value
    FlattenOffset {
        /// Value node
        tag: NodeTag,
    },
    /// Move the value into the offset
    ExtractOffset {
        /// Value node
        tag: NodeTag,
    },
    /// Start an animation; its end is emitted as a host event
    StartAnimation {
        /// Animation id
        animation_id: AnimationId,
        /// Animated value node
        tag: NodeTag,
        /// Driver config map with a `type` field
        config: Value,
    },
    /// Stop an animation
    StopAnimation {
        /// Animation id
        animation_id: AnimationId,
    },
    /// Emit the effective value of a node as a host event
    GetValue {
        /// Value node
        tag: NodeTag,
    },
    /// Bind an event payload field to a value node
    AddEventToView {
        /// Dispatching view
        view: ViewTag,
        /// Event name
        event_name: String,
        /// Mapping with `nativeEventPath` and `animatedValueTag`
        mapping: Value,
    },
    /// Remove an event binding
    RemoveEventFromView {
        /// Dispatching view
        view: ViewTag,
        /// Event name
        event_name: String,
        /// Bound value node
        tag: NodeTag,
    },
}

impl Command {
    /// Short description for logs
    pub fn description(&self) -> String {
        match self {
            Self::CreateNode { tag, .. } => format!("create node [{tag}]"),
            Self::UpdateNodeConfig { tag, .. } => format!("update config of node [{tag}]"),
            Self::DropNode { tag } => format!("drop node [{tag}]"),
            Self::ConnectNodes { parent, child } => format!("connect [{parent}] -> [{child}]"),
            Self::DisconnectNodes { parent, child } => {
                format!("disconnect [{parent}] -> [{child}]")
            }
            Self::ConnectNodeToView { tag, view } => format!("connect [{tag}] to view [{view}]"),
            Self::DisconnectNodeFromView { tag, view } => {
                format!("disconnect [{tag}] from view [{view}]")
            }
            Self::RestoreDefaultValues { tag } => format!("restore defaults of [{tag}]"),
            Self::SetValue { tag, value } => format!("set value of [{tag}] to {value}"),
            Self::SetOffset { tag, offset } => format!("set offset of [{tag}] to {offset}"),
            Self::FlattenOffset { tag } => format!("flatten offset of [{tag}]"),
            Self::ExtractOffset { tag } => format!("extract offset of [{tag}]"),
            Self::StartAnimation {
                animation_id, tag, ..
            } => format!("start animation {animation_id} on [{tag}]"),
            Self::StopAnimation { animation_id } => format!("stop animation {animation_id}"),
            Self::GetValue { tag } => format!("get value of [{tag}]"),
            Self::AddEventToView {
                view, event_name, ..
            } => format!("bind {event_name} of view [{view}]"),
            Self::RemoveEventFromView {
                view,
                event_name,
                tag,
            } => format!("unbind {event_name} of view [{view}] from [{tag}]"),
        }
    }

    /// Run the command on `manager`
    pub fn execute(&self, manager: &mut AnimatedNodesManager) -> Result<()> {
        match self {
            Self::CreateNode { tag, config } => manager.create_animated_node(*tag, config),
            Self::UpdateNodeConfig { tag, config } => {
                manager.update_animated_node_config(*tag, config)
            }
            Self::DropNode { tag } => {
                manager.drop_animated_node(*tag);
                Ok(())
            }
            Self::ConnectNodes { parent, child } => manager.connect_animated_nodes(*parent, *child),
            Self::DisconnectNodes { parent, child } => {
                manager.disconnect_animated_nodes(*parent, *child)
            }
            Self::ConnectNodeToView { tag, view } => {
                manager.connect_animated_node_to_view(*tag, *view)
            }
            Self::DisconnectNodeFromView { tag, view } => {
                manager.disconnect_animated_node_from_view(*tag, *view)
            }
            Self::RestoreDefaultValues { tag } => manager.restore_default_values(*tag),
            Self::SetValue { tag, value } => manager.set_animated_node_value(*tag, *value),
            Self::SetOffset { tag, offset } => manager.set_animated_node_offset(*tag, *offset),
            Self::FlattenOffset { tag } => manager.flatten_animated_node_offset(*tag),
            Self::ExtractOffset { tag } => manager.extract_animated_node_offset(*tag),
            Self::StartAnimation {
                animation_id,
                tag,
                config,
            } => manager.start_animating_node(*animation_id, *tag, config, AnimationEndChannel::Emit),
            Self::StopAnimation { animation_id } => {
                manager.stop_animation(*animation_id);
                Ok(())
            }
            Self::GetValue { tag } => manager.get_value(*tag, ValueReply::Emit),
            Self::AddEventToView {
                view,
                event_name,
                mapping,
            } => manager.add_animated_event_to_view(*view, event_name, mapping),
            Self::RemoveEventFromView {
                view,
                event_name,
                tag,
            } => {
                manager.remove_animated_event_from_view(*view, event_name, *tag);
                Ok(())
            }
        }
    }
}
