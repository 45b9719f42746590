//! Configuration validation.
//!
//! Every problem is collected so they can all be fixed in one pass.

use crate::config::schema::SqlCiConfig;
use crate::error::{Result, SqlCiError};
use crate::steps::TokenBuilder;

/// One problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Position of the offending step, if the problem is step-specific.
    pub step: Option<usize>,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Some(index) => write!(f, "step {}: {}", index + 1, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &SqlCiConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(path) = &config.settings.env_file {
        if path.as_os_str().is_empty() {
            errors.push(ValidationError {
                step: None,
                message: "settings: env_file must not be empty".to_string(),
            });
        }
    }

    if config.settings.variables.keys().any(|name| name.is_empty() || name.contains('=')) {
        errors.push(ValidationError {
            step: None,
            message: "settings: variable names must be non-empty and contain no '='".to_string(),
        });
    }

    for (index, step) in config.steps.iter().enumerate() {
        errors.extend(step.validate().into_iter().map(|message| ValidationError {
            step: Some(index),
            message,
        }));
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &SqlCiConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(SqlCiError::ConfigValidationError {
        message: messages.join("; "),
    })
}
