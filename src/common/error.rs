//! Error types for the execution API
//!
//! Messages are written for the person driving a run from the CLI, with
//! hints on how to resolve common issues.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the execution API
#[derive(Error, Debug)]
pub enum Error {
    // === Server/Connection Errors ===
    #[error("Execution server not running. Start the engine with the execution API enabled")]
    ServerNotRunning,

    #[error("Failed to connect to execution server: {0}")]
    ConnectionFailed(#[source] io::Error),

    #[error("Execution server communication error: {0}")]
    Communication(String),

    // === Protocol Errors ===
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Stream ended before {expected} was received")]
    UnexpectedEndOfStream { expected: String },

    #[error("Message of {size} bytes exceeds the {limit} byte frame limit")]
    MessageTooLarge { size: usize, limit: usize },

    // === Timeout Errors ===
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unexpected end-of-stream error
    pub fn unexpected_end(expected: &str) -> Self {
        Self::UnexpectedEndOfStream {
            expected: expected.to_string(),
        }
    }

    /// Create a file write error
    pub fn file_write(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

/// A problem found while validating spec directories before a run.
///
/// These are not control-flow failures: the request gate turns them into
/// a single `ErrorResult` response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Error with a known source location
    #[error("{file}:{line} {message}")]
    Located {
        file: String,
        line: usize,
        message: String,
    },

    /// Error that is not tied to a location (missing directory, bad flag, ...)
    #[error("{0}")]
    General(String),
}

impl ValidationError {
    /// Create a located validation error
    pub fn at(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Located {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a validation error without a location
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }
}
