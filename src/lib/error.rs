//! Error types for sage-helper
//!
//! Ordinary OS-command failures (non-zero return codes) are *not* errors here:
//! they are recorded in the share state and result objects. Only conditions
//! that make the whole subsystem unusable propagate as `Err`.

use thiserror::Error;

/// Result type alias for sage-helper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sage-helper operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An external tool could not be started at all.
    #[error("Could not launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Run protocol not found: {0}")]
    ProtocolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a launch error for the given command line.
    pub fn launch(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            command: command.into(),
            source,
        }
    }

    /// Whether this error means the environment lacks a required tool.
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}
