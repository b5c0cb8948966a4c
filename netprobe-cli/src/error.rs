//! CLI error types and exit codes.

use netprobe_core::{ConfigError, NetprobeError, SinkError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or output errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Every target failed, or a connection could not be established
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No target could be polled
    #[error("All {total} targets failed")]
    AllTargetsFailed {
        /// Number of targets polled
        total: usize,
    },

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Rendering samples failed
    #[error("Output error: {0}")]
    Output(String),

    /// Async runtime could not start
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SinkError> for CliError {
    fn from(err: SinkError) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<NetprobeError> for CliError {
    fn from(err: NetprobeError) -> Self {
        match err {
            NetprobeError::Config(e) => Self::Config(e.to_string()),
            NetprobeError::Session(e) => Self::Connection(e.to_string()),
            NetprobeError::Device(e) => Self::Connection(e.to_string()),
            NetprobeError::Tracing(e) => Self::Runtime(e.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, output, IO)
    /// - 2: Connection failure (every target failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::AllTargetsFailed { .. } | Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::Output(_) | Self::Runtime(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
