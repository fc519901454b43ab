//! Wire types of the completion and operation endpoints.

use errors::CompletionError;
use serde::{Deserialize, Deserializer, Serialize};
use yc_core::ChatMessage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionRequest<'a> {
    pub model_uri: &'a str,
    pub completion_options: CompletionOptions,
    pub messages: Vec<ChatMessage>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionOptions {
    pub stream: bool,
    pub temperature: f64,
    /// int64 fields travel as strings in the Yandex Cloud JSON mapping.
    pub max_tokens: String
}

/// Answer body. The REST gateway wraps it in `result`; operation responses
/// carry it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CompletionBody {
    Wrapped { result: CompletionResult },
    Bare(CompletionResult)
}

impl CompletionBody {
    pub fn into_result(self) -> CompletionResult {
        match self {
            Self::Wrapped { result } | Self::Bare(result) => result
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResult {
    pub alternatives: Vec<Alternative>,
    pub usage: Usage
}

#[derive(Debug, Deserialize)]
pub(crate) struct Alternative {
    pub message: AnswerMessage
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerMessage {
    pub text: String
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Usage {
    #[serde(deserialize_with = "token_count")]
    pub completion_tokens: u32
}

impl CompletionResult {
    /// Text of the first alternative with its token cost.
    pub fn into_answer(self) -> Result<(String, u32), CompletionError> {
        let tokens = self.usage.completion_tokens;
        self.alternatives
            .into_iter()
            .next()
            .map(|alternative| (alternative.message.text, tokens))
            .ok_or_else(|| CompletionError::InvalidResponse {
                reason: "no alternatives in completion".to_string()
            })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AsyncAccepted {
    pub id: String
}

#[derive(Debug, Deserialize)]
pub(crate) struct Operation {
    #[serde(default)]
    pub done: bool,
    pub response: Option<CompletionResult>,
    pub error: Option<OperationError>
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String
}

impl Operation {
    pub fn into_result(self, operation_id: &str) -> Result<CompletionResult, CompletionError> {
        if let Some(error) = self.error {
            return Err(CompletionError::InvalidResponse {
                reason: format!(
                    "operation {} failed with code {}: {}",
                    operation_id, error.code, error.message
                )
            });
        }
        self.response.ok_or_else(|| CompletionError::InvalidResponse {
            reason: format!("operation {} is done without a response", operation_id)
        })
    }
}

fn token_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String)
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom)
    }
}
