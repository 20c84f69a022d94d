// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host layer for `OrdoPlay` Animated.
//!
//! Runs an [`AnimatedNodesManager`](ordoplay_animated_graph::AnimatedNodesManager)
//! on a dedicated render thread and feeds it commands, frame ticks and view
//! events queued from anywhere:
//! - [`render_thread`]: the thread and its cloneable handle
//! - [`command`]: serializable graph commands
//! - [`script`]: RON replay scripts
//! - [`config`]: host settings
//! - [`sink`]: recording and JSON-lines sinks

pub mod command;
pub mod config;
pub mod error;
pub mod render_thread;
pub mod script;
pub mod sink;

pub use command::Command;
pub use config::{HostConfig, CONFIG_FORMAT_VERSION, DEFAULT_FRAME_INTERVAL_NANOS};
pub use error::{HostError, Result};
pub use render_thread::{CommandFailure, HostCommand, RenderHandle, RenderTask, RenderThread};
pub use script::{ReplayScript, ScriptStep, SCRIPT_FORMAT_VERSION};
pub use sink::{AppliedProps, JsonLines, Recorder};
