//! Error types for the operations crate.

use std::net::SocketAddr;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error when loading config.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// Validation failed with one or more errors.
    #[error("config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}

/// Errors produced by a listener's serve loop.
///
/// `Closed` is not a failure: it is the distinguished condition a listener
/// reports when it was stopped on purpose, so the orchestrator can tell
/// "I was told to stop" apart from "I crashed".
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener was stopped as part of an intentional shutdown.
    #[error("listener closed")]
    Closed,

    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("accept failed on listener '{name}': {source}")]
    Accept {
        name: String,
        source: std::io::Error,
    },
}

impl ServeError {
    /// True when the listener stopped because it was asked to.
    pub fn is_closed(&self) -> bool {
        matches!(self, ServeError::Closed)
    }
}
