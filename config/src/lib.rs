//! # Configuration System
//!
//! Centralized configuration for the YandexGPT client.
//!
//! This crate provides:
//! - Configuration structures for the completion, context, cache and
//!   endpoint settings
//! - Environment variable loading (`YAGPT_*`)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{AuthConfig, Config, ContextConfig, EndpointConfig, GptConfig, RedisConfig};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::merge_configs;
pub use validation::{ConfigValidationError, validate};
pub use ::validator::Validate;
