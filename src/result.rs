use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

use crate::{client::ClientError, sink::SinkError};

pub type Result<T> = std::result::Result<T, HeraldError>;

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("Failed to load configuration from: {path}")]
    ConfigLoadError { path: PathBuf, message: String },

    #[error("Failed to save configuration to: {path}")]
    ConfigSaveError { path: PathBuf, message: String },

    #[error("Invalid configuration: {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid repository '{input}': {reason}")]
    InvalidRepository { input: CompactString, reason: CompactString },

    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(CompactString),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl HeraldError {
    /// Create a configuration load error
    pub fn config_load_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigLoadError { path, message: source.to_string() }
    }

    /// Create a configuration save error
    pub fn config_save_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigSaveError { path, message: source.to_string() }
    }

    /// Create a configuration validation error
    pub fn config_validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidationError { field: field.into(), message: message.into() }
    }

    pub fn invalid_repository(
        input: impl Into<CompactString>,
        reason: impl Into<CompactString>,
    ) -> Self {
        Self::InvalidRepository { input: input.into(), reason: reason.into() }
    }
}
