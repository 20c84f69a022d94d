// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host configuration.
//!
//! Stored as RON. Missing fields fall back to their defaults, so a config
//! file only needs the settings it changes.

use crate::error::{HostError, Result};
use ordoplay_animated_graph::ConsistencyPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Frame interval at 60 fps
pub const DEFAULT_FRAME_INTERVAL_NANOS: i64 = 1_000_000_000 / 60;

/// Settings of the host executor and replay tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Config format version
    pub version: u32,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Reaction to graphs that cannot be ordered
    pub consistency: ConsistencyPolicy,
    /// Time between two frames
    pub frame_interval_nanos: i64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            log_filter: "ordoplay_animated=info".to_string(),
            consistency: ConsistencyPolicy::Strict,
            frame_interval_nanos: DEFAULT_FRAME_INTERVAL_NANOS,
        }
    }
}

impl HostConfig {
    /// Parse a config from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: HostConfig = ron::from_str(content).map_err(|source| HostError::Parse {
            what: "host config",
            source,
        })?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(HostError::UnsupportedVersion {
                what: "Host config",
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Write the config as pretty RON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
