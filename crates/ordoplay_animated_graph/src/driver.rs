// SPDX-License-Identifier: MIT OR Apache-2.0
//! Active animations bound to value nodes.

use crate::error::Result;
use crate::node::{NodeTag, ValueState};
use crate::notify::{AnimationEnd, AnimationEndChannel};
use ordoplay_animated_drivers::DriverModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Host-assigned identifier of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationId(pub i32);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A driver stepping one value node
#[derive(Debug)]
pub struct AnimationDriver {
    /// Animation id
    pub id: AnimationId,
    /// Target value node
    pub node_tag: NodeTag,
    model: DriverModel,
    end: AnimationEndChannel,
}

impl AnimationDriver {
    /// Build a driver from a host animation config
    pub fn new(
        id: AnimationId,
        node_tag: NodeTag,
        config: &Value,
        end: AnimationEndChannel,
    ) -> Result<Self> {
        Ok(Self {
            id,
            node_tag,
            model: DriverModel::from_config(config)?,
            end,
        })
    }

    /// Reconfigure in place, keeping the end channel
    pub fn reset_config(&mut self, config: &Value) -> Result<()> {
        self.model.reset_config(config)?;
        Ok(())
    }

    /// Step the model, writing the target's raw value
    pub fn run_animation_step(&mut self, frame_time_nanos: i64, state: &mut ValueState) {
        self.model.run_animation_step(frame_time_nanos, &mut state.value);
    }

    /// Whether the model reached its end condition
    pub fn has_finished(&self) -> bool {
        self.model.has_finished()
    }

    /// Driver model
    pub fn model(&self) -> &DriverModel {
        &self.model
    }

    /// Consume the driver into its end report
    pub(crate) fn into_end(self, finished: bool, value: f64) -> (AnimationEnd, AnimationEndChannel) {
        (
            AnimationEnd {
                animation_id: self.id,
                finished,
                value,
            },
            self.end,
        )
    }
}
