//! Core error types for restcycle-core.
//!
//! Invalid state transitions (starting a running account, stopping an idle
//! one) are not errors: the engine treats them as silent no-ops. The types
//! here cover bad input, unknown account ids, configuration I/O and port
//! failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::account::AccountId;

/// Core error type for restcycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A command referenced an account the engine does not track
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// The scheduler loop has shut down and no longer accepts commands
    #[error("Scheduler is not running")]
    SchedulerClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not resolve or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors for user supplied goal/interval/rest values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Non-numeric or negative input. The prior value is kept.
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidConfiguration {
        field: String,
        value: String,
        reason: String,
    },
}

/// Failures reported by render/notify/sound ports.
///
/// These never reach the timer engine; the dispatcher logs them and falls
/// back where it can.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The output device is missing or refused the request
    #[error("{port} unavailable: {message}")]
    Unavailable { port: &'static str, message: String },

    /// The port has no implementation for this operation
    #[error("{0} not supported")]
    Unsupported(&'static str),
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
