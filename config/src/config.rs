//! # Configuration Structures
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization, every field has a default
//! - Use `validator` for input validation

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const DEFAULT_LLM_BASE_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1";
pub const DEFAULT_OPERATION_BASE_URL: &str = "https://operation.api.cloud.yandex.net";

/// Top-level configuration of the YandexGPT client.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Context limit: {} messages", config.context.max_context_messages);
/// ```
///
/// ## Fields
/// - `gpt`: completion request settings (folder, role, model, async mode)
/// - `context`: conversation context limits
/// - `redis`: cache connection
/// - `auth`: service account key location
/// - `endpoints`: Yandex Cloud endpoint URLs
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub gpt: GptConfig,

    #[serde(default)]
    #[validate(nested)]
    pub context: ContextConfig,

    #[serde(default)]
    #[validate(nested)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    #[validate(nested)]
    pub endpoints: EndpointConfig
}

/// Completion request settings.
///
/// ## Fields
/// - `folder_id`: Yandex Cloud folder the model is billed to (required)
/// - `gpt_role`: system message prepended to every request (required)
/// - `model`: model path inside the folder (default: "yandexgpt-lite/latest")
/// - `temperature`: sampling temperature (default: 0.3, range: 0.0-1.0)
/// - `max_answer_tokens`: answer length limit (default: 500)
/// - `async_mode`: use `completionAsync` and poll the operation (default: false)
/// - `async_timeout_seconds`: poll deadline (default: 60)
/// - `poll_interval_ms`: sleep between polls (default: 1000)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct GptConfig {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub folder_id: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub gpt_role: String,

    #[serde(default = "default_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature: f64,

    #[serde(default = "default_max_answer_tokens")]
    #[validate(range(min = 1))]
    pub max_answer_tokens: u32,

    #[serde(default)]
    pub async_mode: bool,

    #[serde(default = "default_async_timeout_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub async_timeout_seconds: u64,

    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub poll_interval_ms: u64
}

impl GptConfig {
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.folder_id, self.model)
    }
}

impl Default for GptConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            gpt_role: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_answer_tokens: default_max_answer_tokens(),
            async_mode: false,
            async_timeout_seconds: default_async_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms()
        }
    }
}

/// Conversation context limits.
///
/// ## Fields
/// - `max_context_messages`: entries kept per session (default: 5, min: 1)
/// - `max_tokens`: cumulative token budget per session (default: 7500, min: 1)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ContextConfig {
    #[serde(default = "default_max_context_messages")]
    #[validate(range(min = 1, max = 1000))]
    pub max_context_messages: usize,

    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_messages: default_max_context_messages(),
            max_tokens: default_max_tokens()
        }
    }
}

/// Redis cache connection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://localhost:6379/0`
    #[serde(default = "default_redis_url")]
    #[validate(length(min = 1))]
    pub url: String
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url()
        }
    }
}

/// Location of the service account authorized key (JSON file).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthConfig {
    #[serde(default)]
    pub service_account_key_file: Option<String>
}

/// Yandex Cloud endpoint URLs. Overridable for testing against mocks.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct EndpointConfig {
    #[serde(default = "default_iam_token_url")]
    #[validate(url)]
    pub iam_token_url: String,

    #[serde(default = "default_llm_base_url")]
    #[validate(url)]
    pub llm_base_url: String,

    #[serde(default = "default_operation_base_url")]
    #[validate(url)]
    pub operation_base_url: String
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            iam_token_url: default_iam_token_url(),
            llm_base_url: default_llm_base_url(),
            operation_base_url: default_operation_base_url()
        }
    }
}

pub(crate) fn default_model() -> String {
    "yandexgpt-lite/latest".to_string()
}

pub(crate) fn default_temperature() -> f64 {
    0.3
}

pub(crate) fn default_max_answer_tokens() -> u32 {
    500
}

pub(crate) fn default_async_timeout_seconds() -> u64 {
    60
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    1000
}

pub(crate) fn default_max_context_messages() -> usize {
    5
}

pub(crate) fn default_max_tokens() -> u32 {
    7500
}

pub(crate) fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

pub(crate) fn default_iam_token_url() -> String {
    DEFAULT_IAM_TOKEN_URL.to_string()
}

pub(crate) fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

pub(crate) fn default_operation_base_url() -> String {
    DEFAULT_OPERATION_BASE_URL.to_string()
}
