//! Error types for `netprobe`
//!
//! Transport and identification errors end the poll of a single target.
//! Collector-level errors live in [`crate::collector`] and are absorbed by the
//! orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by an interactive shell session
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP dial or SSH handshake failed
    #[error("Failed to connect to {address}: {reason}")]
    Connect {
        /// Remote address (`host:port`)
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// Dial and handshake did not finish in time
    #[error("Connection to {address} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Remote address (`host:port`)
        address: String,
        /// Configured limit
        timeout: Duration,
    },

    /// The device rejected the credentials
    #[error("Authentication failed for {username}@{address}")]
    AuthenticationFailed {
        /// Login name that was tried
        username: String,
        /// Remote address (`host:port`)
        address: String,
    },

    /// Opening the channel, PTY or shell failed
    #[error("Failed to open shell on {address}: {reason}")]
    Channel {
        /// Remote address (`host:port`)
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// No completed response arrived before the deadline
    #[error("Timeout reached after {timeout:?} waiting for `{command}`")]
    Timeout {
        /// The command that was sent
        command: String,
        /// Configured limit
        timeout: Duration,
    },

    /// The remote end closed the shell
    #[error("EOF")]
    EndOfStream,

    /// Writing to the shell failed
    #[error("Failed to write to shell: {0}")]
    Write(#[source] std::io::Error),

    /// Reading from the shell failed
    #[error("Failed to read from shell: {0}")]
    Read(#[source] std::io::Error),

    /// The prompt pattern does not compile
    #[error("Invalid prompt pattern '{pattern}': {reason}")]
    InvalidPrompt {
        /// The pattern as configured
        pattern: String,
        /// Compiler message
        reason: String,
    },
}

impl SessionError {
    /// Returns true when the remote end closed the stream
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Returns true for a command that did not complete in time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while identifying a device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// `show version` did not contain any known OS marker
    #[error("Unknown OS")]
    UnknownOs,

    /// The identification command itself failed
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The YAML document is malformed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A device host entry is not `host[:port]`
    #[error("Invalid host '{0}'")]
    InvalidHost(String),

    /// No key file or password applies to a device
    #[error("No valid authentication method available for {0}")]
    NoAuthentication(String),

    /// The private key could not be loaded
    #[error("Could not load ssh private key file {path}: {reason}")]
    KeyFile {
        /// Expanded key path
        path: String,
        /// Loader message
        reason: String,
    },

    /// No targets configured
    #[error("No devices configured")]
    NoDevices,

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for callers that do not care about the layer
#[derive(Debug, Error)]
pub enum NetprobeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Device error
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Tracing setup error
    #[error("Tracing error: {0}")]
    Tracing(#[from] crate::tracing::TracingError),
}
