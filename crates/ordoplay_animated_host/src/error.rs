// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host error type.

use ordoplay_animated_graph::AnimatedError;
use std::path::PathBuf;

/// Error raised by the host layer
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Reading or writing a file failed
    #[error("Failed to access {path:?}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A RON document could not be parsed
    #[error("Failed to parse {what}: {source}")]
    Parse {
        /// Kind of document
        what: &'static str,
        /// Underlying error with position
        #[source]
        source: ron::error::SpannedError,
    },

    /// A document could not be written as RON
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] ron::Error),

    /// A document was written by a newer version
    #[error("{what} version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Kind of document
        what: &'static str,
        /// Version in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// The render thread could not be started
    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The render thread is gone
    #[error("Render thread is not running")]
    RenderThreadStopped,

    /// The render thread panicked
    #[error("Render thread panicked")]
    RenderThreadPanicked,

    /// A graph command failed
    #[error(transparent)]
    Animated(#[from] AnimatedError),
}

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;
