use async_trait::async_trait;
use errors::TokenizerError;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use yc_core::{ChatMessage, Tokenizer};

/// Token counting through the Foundation Models `tokenize` endpoints.
pub struct HttpTokenizer {
    http_client: Client,
    base_url: String,
    model_uri: String,
    max_tokens: u32
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenizeRequest<'a> {
    model_uri: &'a str,
    text: &'a str
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenizeCompletionRequest<'a> {
    model_uri: &'a str,
    completion_options: TokenizeOptions,
    messages: &'a [ChatMessage]
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenizeOptions {
    stream: bool,
    max_tokens: u32
}

#[derive(Deserialize)]
struct TokenizeResponse {
    tokens: Vec<serde_json::Value>
}

impl HttpTokenizer {
    /// `base_url` is the Foundation Models API root, e.g.
    /// `https://llm.api.cloud.yandex.net/foundationModels/v1`.
    pub fn new(base_url: &str, model_uri: &str, max_tokens: u32) -> Result<Self, TokenizerError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TokenizerError::Connection {
                reason: e.to_string()
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_uri: model_uri.to_string(),
            max_tokens
        })
    }

    pub fn model_uri(&self) -> &str {
        &self.model_uri
    }

    async fn count<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
        iam_token: &str
    ) -> Result<u32, TokenizerError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(iam_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "Connection to tokenizer failed");
                TokenizerError::Connection {
                    reason: e.to_string()
                }
            })?;

        let count = parse_count(response).await?;
        debug!(endpoint, tokens = count, "Tokenized");
        Ok(count)
    }
}

async fn parse_count(response: Response) -> Result<u32, TokenizerError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status, body = %body, "Tokenization failed");
        return Err(TokenizerError::Status { status, body });
    }

    let parsed: TokenizeResponse =
        response
            .json()
            .await
            .map_err(|e| TokenizerError::MalformedResponse {
                reason: e.to_string()
            })?;
    token_count(parsed.tokens.len())
}

fn token_count(len: usize) -> Result<u32, TokenizerError> {
    u32::try_from(len).map_err(|_| TokenizerError::MalformedResponse {
        reason: format!("token count {} exceeds u32", len)
    })
}

#[async_trait]
impl Tokenizer for HttpTokenizer {
    async fn tokenize(&self, text: &str, iam_token: &str) -> Result<u32, TokenizerError> {
        let body = TokenizeRequest {
            model_uri: &self.model_uri,
            text
        };
        self.count("tokenize", &body, iam_token).await
    }

    async fn tokenize_completion(
        &self,
        messages: &[ChatMessage],
        iam_token: &str
    ) -> Result<u32, TokenizerError> {
        let body = TokenizeCompletionRequest {
            model_uri: &self.model_uri,
            completion_options: TokenizeOptions {
                stream: false,
                max_tokens: self.max_tokens
            },
            messages
        };
        self.count("tokenizeCompletion", &body, iam_token).await
    }
}
