// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay scripts.
//!
//! A script is a RON list of steps: graph commands, runs of frames and view
//! events. Playing it queues every step on a render thread.
//!
//! ```ron
//! (
//!     version: 1,
//!     steps: [
//!         Command(CreateNode(tag: 1, config: {"type": "value", "value": 0.0})),
//!         Command(StartAnimation(animation_id: 1, tag: 1, config: {"type": "decay", "velocity": 1.0})),
//!         Frames(30),
//!     ],
//! )
//! ```

use crate::command::Command;
use crate::error::{HostError, Result};
use crate::render_thread::RenderHandle;
use ordoplay_animated_graph::{AnimatedEvent, ViewTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Current script format version
pub const SCRIPT_FORMAT_VERSION: u32 = 1;

/// One script step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Graph command
    Command(Command),
    /// Run this many frames
    Frames(u32),
    /// Dispatch a view event
    Event {
        /// Dispatching view
        view: ViewTag,
        /// Event name
        name: String,
        /// Event payload
        payload: Value,
    },
}

/// Sequence of steps replayed against a render thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Script format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Steps, in order
    pub steps: Vec<ScriptStep>,
}

fn default_version() -> u32 {
    SCRIPT_FORMAT_VERSION
}

impl ReplayScript {
    /// Parse a script from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let script: ReplayScript = ron::from_str(content).map_err(|source| HostError::Parse {
            what: "replay script",
            source,
        })?;

        if script.version > SCRIPT_FORMAT_VERSION {
            return Err(HostError::UnsupportedVersion {
                what: "Replay script",
                found: script.version,
                supported: SCRIPT_FORMAT_VERSION,
            });
        }
        Ok(script)
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Number of frames the script runs
    pub fn frame_count(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| match step {
                ScriptStep::Frames(count) => u64::from(*count),
                _ => 0,
            })
            .sum()
    }

    /// Queue every step, starting the frame clock at `start_nanos`.
    ///
    /// Returns the time of the next frame after the script.
    pub fn play(
        &self,
        handle: &RenderHandle,
        start_nanos: i64,
        frame_interval_nanos: i64,
    ) -> Result<i64> {
        let mut frame_time = start_nanos;
        for step in &self.steps {
            match step {
                ScriptStep::Command(command) => handle.apply(command.clone())?,
                ScriptStep::Frames(count) => {
                    for _ in 0..*count {
                        handle.frame(frame_time)?;
                        frame_time += frame_interval_nanos;
                    }
                }
                ScriptStep::Event {
                    view,
                    name,
                    payload,
                } => handle.dispatch_event(AnimatedEvent {
                    view_tag: *view,
                    name: name.clone(),
                    payload: payload.clone(),
                })?,
            }
        }
        tracing::debug!(
            "Queued {} steps, {} frames",
            self.steps.len(),
            self.frame_count()
        );
        Ok(frame_time)
    }
}
