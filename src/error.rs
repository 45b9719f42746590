//! Error types for sqlci operations.
//!
//! This module defines [`SqlCiError`], the error type used throughout the
//! crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Staging and process errors abort one invocation; the invocation
//!   façade reports them and turns them into a failed result
//! - Environment resolution errors are recovered where they occur
//! - Use `anyhow::Error` (via `SqlCiError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sqlci operations.
#[derive(Debug, Error)]
pub enum SqlCiError {
    /// The runner script (or a companion resource) could not be found.
    #[error("{resource} cannot be found. Checked: {}", checked.join(", "))]
    ResourceNotFound {
        resource: String,
        checked: Vec<String>,
    },

    /// A bundled resource could not be copied into the working directory.
    #[error("Failed to stage {}: {source}", path.display())]
    StagingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Starting or talking to the child process failed.
    #[error("Unexpected I/O error executing {command}: {source}")]
    ProcessIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The child was terminated before it could report an exit code.
    #[error("Execution of {command} was interrupted")]
    Interrupted { command: String },

    /// The caller's runtime environment could not be resolved.
    #[error("Failed to resolve environment from {source_name}: {message}")]
    EnvironmentResolution {
        source_name: String,
        message: String,
    },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SqlCiError {
    /// Whether this error comes from configuration rather than from running
    /// a step.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SqlCiError::ConfigNotFound { .. }
                | SqlCiError::ConfigParseError { .. }
                | SqlCiError::ConfigValidationError { .. }
        )
    }
}

/// Result type alias for sqlci operations.
pub type Result<T> = std::result::Result<T, SqlCiError>;
