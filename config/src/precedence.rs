//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)
//!
//! A source only overrides a field when it holds a non-default value, so an
//! unset environment variable never masks a value from the file.

use crate::config::{Config, ContextConfig, EndpointConfig, GptConfig};
use tracing::debug;

/// Merge configuration sources with precedence.
///
/// ```rust,no_run
/// use config::{Config, load_from_env, load_from_file, merge_configs};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let from_file = load_from_file(Path::new("yagpt.toml"))?;
///     let from_env = load_from_env()?;
///     let _config = merge_configs(Config::default(), Some(from_file), from_env);
///     Ok(())
/// }
/// ```
pub fn merge_configs(defaults: Config, file_config: Option<Config>, env_config: Config) -> Config {
    let mut config = defaults;

    if let Some(file) = file_config {
        config = merge_with_logging(config, file, "file");
    }
    merge_with_logging(config, env_config, "env")
}

fn merge_with_logging(mut base: Config, over: Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_gpt(&mut base.gpt, over.gpt, &mut changes);
    merge_context(&mut base.context, over.context, &mut changes);
    merge_endpoints(&mut base.endpoints, over.endpoints, &mut changes);

    if over.redis != Default::default() && over.redis != base.redis {
        changes.push(format!("redis.url = {}", over.redis.url));
        base.redis = over.redis;
    }
    if over.auth.service_account_key_file.is_some() {
        changes.push("auth.service_account_key_file".to_string());
        base.auth = over.auth;
    }

    if !changes.is_empty() {
        debug!(source = source_name, changes = ?changes, "Applied configuration overrides");
    }

    base
}

fn merge_gpt(base: &mut GptConfig, over: GptConfig, changes: &mut Vec<String>) {
    let defaults = GptConfig::default();

    if !over.folder_id.is_empty() && over.folder_id != base.folder_id {
        changes.push(format!("gpt.folder_id = {}", over.folder_id));
        base.folder_id = over.folder_id;
    }
    if !over.gpt_role.is_empty() && over.gpt_role != base.gpt_role {
        changes.push("gpt.gpt_role".to_string());
        base.gpt_role = over.gpt_role;
    }
    if over.model != defaults.model && over.model != base.model {
        changes.push(format!("gpt.model = {}", over.model));
        base.model = over.model;
    }
    if (over.temperature - defaults.temperature).abs() > f64::EPSILON {
        changes.push(format!("gpt.temperature = {}", over.temperature));
        base.temperature = over.temperature;
    }
    if over.max_answer_tokens != defaults.max_answer_tokens {
        changes.push(format!("gpt.max_answer_tokens = {}", over.max_answer_tokens));
        base.max_answer_tokens = over.max_answer_tokens;
    }
    if over.async_mode {
        changes.push("gpt.async_mode = true".to_string());
        base.async_mode = true;
    }
    if over.async_timeout_seconds != defaults.async_timeout_seconds {
        changes.push(format!(
            "gpt.async_timeout_seconds = {}",
            over.async_timeout_seconds
        ));
        base.async_timeout_seconds = over.async_timeout_seconds;
    }
    if over.poll_interval_ms != defaults.poll_interval_ms {
        changes.push(format!("gpt.poll_interval_ms = {}", over.poll_interval_ms));
        base.poll_interval_ms = over.poll_interval_ms;
    }
}

fn merge_context(base: &mut ContextConfig, over: ContextConfig, changes: &mut Vec<String>) {
    let defaults = ContextConfig::default();

    if over.max_context_messages != defaults.max_context_messages {
        changes.push(format!(
            "context.max_context_messages = {}",
            over.max_context_messages
        ));
        base.max_context_messages = over.max_context_messages;
    }
    if over.max_tokens != defaults.max_tokens {
        changes.push(format!("context.max_tokens = {}", over.max_tokens));
        base.max_tokens = over.max_tokens;
    }
}

fn merge_endpoints(base: &mut EndpointConfig, over: EndpointConfig, changes: &mut Vec<String>) {
    let defaults = EndpointConfig::default();

    if over.iam_token_url != defaults.iam_token_url {
        changes.push(format!("endpoints.iam_token_url = {}", over.iam_token_url));
        base.iam_token_url = over.iam_token_url;
    }
    if over.llm_base_url != defaults.llm_base_url {
        changes.push(format!("endpoints.llm_base_url = {}", over.llm_base_url));
        base.llm_base_url = over.llm_base_url;
    }
    if over.operation_base_url != defaults.operation_base_url {
        changes.push(format!(
            "endpoints.operation_base_url = {}",
            over.operation_base_url
        ));
        base.operation_base_url = over.operation_base_url;
    }
}
