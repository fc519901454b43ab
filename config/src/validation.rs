//! # Configuration Validation
//!
//! Validates configuration structures using the `validator` crate.
//!
//! ## Validation Rules
//! - `gpt.folder_id`, `gpt.gpt_role`: must be set
//! - `gpt.temperature`: 0.0-1.0
//! - `gpt.async_timeout_seconds`: 1-3600
//! - `context.max_context_messages`: 1-1000
//! - `context.max_tokens`: at least 1
//! - `endpoints.*`: valid URLs

use crate::config::Config;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors)
}

/// Validates every nested section of `config`.
///
/// ```rust,no_run
/// use config::{Config, validate};
///
/// let config = Config::default();
/// if let Err(e) = validate(&config) {
///     eprintln!("{e}");
/// }
/// ```
pub fn validate(config: &Config) -> Result<(), ConfigValidationError> {
    config.validate()?;
    Ok(())
}
