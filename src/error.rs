//! Error types for netsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Each concern gets its own
//! enum so callers can tell a host-scoped failure from a run-level one.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while attempting a connection or scanning a host.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Connection failed to {target}:{port}: {reason}")]
    ConnectionFailed {
        target: Ipv4Addr,
        port: u16,
        reason: String,
    },

    #[error("Connection timed out")]
    Timeout,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Host unreachable")]
    HostUnreachable,

    /// The process ran out of sockets, descriptors or ephemeral ports.
    #[error("Local resources exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Checkpoint failure: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl ScanError {
    /// Whether this failure must abort the whole host scan rather than
    /// being recorded as a closed port.
    pub fn is_host_fatal(&self) -> bool {
        matches!(
            self,
            Self::ResourceExhausted(_) | Self::Checkpoint(_)
        )
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Checkpoint file errors.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("failed to read checkpoint {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open checkpoint {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create checkpoint directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors raised before discovery can start.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("no usable IPv4 interface found")]
    NoLocalAddress,
}

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write config file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
