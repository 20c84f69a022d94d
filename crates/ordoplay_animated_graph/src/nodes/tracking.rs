// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracking node.

use crate::driver::AnimationId;
use crate::error::Result;
use crate::graph::Lookup;
use crate::node::NodeTag;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keeps an animation on `value` heading towards the current value of
/// `to_value`, restarting it whenever the target moves
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingNode {
    /// Animation to (re)start
    pub animation_id: AnimationId,
    /// Node whose value becomes the animation's `toValue`
    pub to_value: NodeTag,
    /// Node being animated
    pub value: NodeTag,
    /// Driver config, `toValue` is overwritten on every update
    pub animation_config: Map<String, Value>,
}

/// Request to start or retarget an animation after a propagation pass
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRestart {
    /// Animation id
    pub animation_id: AnimationId,
    /// Animated value node
    pub node_tag: NodeTag,
    /// Driver config with the new `toValue`
    pub config: Value,
}

impl TrackingNode {
    pub(crate) fn update(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<AnimationRestart> {
        let to_value = lookup.value(tag, self.to_value)?;
        let mut config = self.animation_config.clone();
        config.insert("toValue".to_string(), Value::from(to_value));
        Ok(AnimationRestart {
            animation_id: self.animation_id,
            node_tag: self.value,
            config: Value::Object(config),
        })
    }
}
