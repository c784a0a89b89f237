//! Core error types for breathpacer-core.
//!
//! The session engine itself has no fatal error path. These types cover the
//! edges around it: loading configuration, strict validation for callers who
//! want it, and collaborator failures that the engine logs and swallows.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathpacer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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

    /// Home/config directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors raised by strict constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Every phase of the breathing pattern is zero seconds long
    #[error("Breathing pattern has no phase longer than zero seconds")]
    EmptyPattern,

    /// Only one of the paced/settle pair was supplied
    #[error("Two-stage sessions need both paced and settle seconds")]
    IncompleteTwoStage,
}

/// Failures reported by a cue emitter.
///
/// The session engine never propagates these; a failed cue is a no-op cue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// The device has no audio output or vibration motor
    #[error("{0} output is unavailable")]
    Unavailable(&'static str),

    /// The output exists but rejected the request
    #[error("cue emission failed: {0}")]
    Failed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
