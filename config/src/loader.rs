//! # Environment Variable Loader
//!
//! Loads configuration from `YAGPT_*` environment variables following
//! 12-factor app principles. Unset or unparsable variables fall back to the
//! defaults.

use crate::config::{
    AuthConfig, Config, ContextConfig, EndpointConfig, GptConfig, RedisConfig,
    default_async_timeout_seconds, default_iam_token_url, default_llm_base_url,
    default_max_answer_tokens, default_max_context_messages, default_max_tokens, default_model,
    default_operation_base_url, default_poll_interval_ms, default_redis_url, default_temperature,
};
use std::env;

/// Load configuration from environment variables.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Folder: {}", config.gpt.folder_id);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Completion (`YAGPT_*`)
/// - `YAGPT_FOLDER_ID`: Yandex Cloud folder id
/// - `YAGPT_ROLE`: system role text
/// - `YAGPT_MODEL`: model path (default: "yandexgpt-lite/latest")
/// - `YAGPT_TEMPERATURE`: sampling temperature (default: 0.3)
/// - `YAGPT_MAX_ANSWER_TOKENS`: answer length limit (default: 500)
/// - `YAGPT_ASYNC_MODE`: true/false (default: false)
/// - `YAGPT_ASYNC_TIMEOUT_SECONDS`: poll deadline (default: 60)
/// - `YAGPT_POLL_INTERVAL_MS`: sleep between polls (default: 1000)
///
/// ### Context
/// - `YAGPT_MAX_CONTEXT_MESSAGES`: entries per session (default: 5)
/// - `YAGPT_MAX_TOKENS`: token budget per session (default: 7500)
///
/// ### Cache and credentials
/// - `YAGPT_REDIS_URL`: Redis URL (default: "redis://localhost:6379")
/// - `YAGPT_SERVICE_ACCOUNT_KEY_FILE`: path to the authorized key JSON
///
/// ### Endpoints
/// - `YAGPT_IAM_TOKEN_URL`, `YAGPT_LLM_BASE_URL`, `YAGPT_OPERATION_BASE_URL`
pub fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config {
        gpt: load_gpt_from_env()?,
        context: load_context_from_env()?,
        redis: RedisConfig {
            url: env::var("YAGPT_REDIS_URL").unwrap_or_else(|_| default_redis_url())
        },
        auth: AuthConfig {
            service_account_key_file: env::var("YAGPT_SERVICE_ACCOUNT_KEY_FILE").ok()
        },
        endpoints: load_endpoints_from_env()?
    };

    Ok(config)
}

fn load_gpt_from_env() -> Result<GptConfig, Box<dyn std::error::Error>> {
    Ok(GptConfig {
        folder_id: env::var("YAGPT_FOLDER_ID").unwrap_or_default(),
        gpt_role: env::var("YAGPT_ROLE").unwrap_or_default(),
        model: env::var("YAGPT_MODEL").unwrap_or_else(|_| default_model()),
        temperature: parse_env("YAGPT_TEMPERATURE").unwrap_or_else(|_| default_temperature()),
        max_answer_tokens: parse_env("YAGPT_MAX_ANSWER_TOKENS")
            .unwrap_or_else(|_| default_max_answer_tokens()),
        async_mode: parse_env("YAGPT_ASYNC_MODE").unwrap_or(false),
        async_timeout_seconds: parse_env("YAGPT_ASYNC_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| default_async_timeout_seconds()),
        poll_interval_ms: parse_env("YAGPT_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| default_poll_interval_ms())
    })
}

fn load_context_from_env() -> Result<ContextConfig, Box<dyn std::error::Error>> {
    Ok(ContextConfig {
        max_context_messages: parse_env("YAGPT_MAX_CONTEXT_MESSAGES")
            .unwrap_or_else(|_| default_max_context_messages()),
        max_tokens: parse_env("YAGPT_MAX_TOKENS").unwrap_or_else(|_| default_max_tokens())
    })
}

fn load_endpoints_from_env() -> Result<EndpointConfig, Box<dyn std::error::Error>> {
    Ok(EndpointConfig {
        iam_token_url: env::var("YAGPT_IAM_TOKEN_URL").unwrap_or_else(|_| default_iam_token_url()),
        llm_base_url: env::var("YAGPT_LLM_BASE_URL").unwrap_or_else(|_| default_llm_base_url()),
        operation_base_url: env::var("YAGPT_OPERATION_BASE_URL")
            .unwrap_or_else(|_| default_operation_base_url())
    })
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}
