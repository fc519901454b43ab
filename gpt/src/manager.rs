use crate::completion::{
    AsyncAccepted, CompletionBody, CompletionOptions, CompletionRequest, CompletionResult,
    Operation
};
use crate::prompt::DefaultPromptCleaner;
use crate::tokenizer::HttpTokenizer;
use auth::{CredentialManager, ServiceAccountKey};
use config::Config;
use context::ContextManager;
use errors::{CompletionError, GptError};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use storage::RedisCache;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use yc_core::{
    Cache, ChatMessage, ContextStore, MessageContext, PromptCleaner, Role, SessionId, Tokenizer
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Answers prompts within a session, keeping the session context bounded.
pub struct GptManager {
    credentials: Arc<CredentialManager>,
    context: Arc<dyn ContextStore>,
    tokenizer: Arc<dyn Tokenizer>,
    cleaner: Arc<dyn PromptCleaner>,
    http_client: Client,
    folder_id: String,
    model_uri: String,
    system_message: ChatMessage,
    temperature: f64,
    max_answer_tokens: u32,
    async_mode: bool,
    async_timeout: Duration,
    poll_interval: Duration,
    llm_base_url: String,
    operation_base_url: String,
    role_tokens: Mutex<Option<u32>>
}

/// Assembles a [`GptManager`]. Collaborators not supplied here get their
/// default implementations: a Redis backed [`ContextManager`], the HTTP
/// tokenizer and the default prompt cleaner.
pub struct GptManagerBuilder {
    config: Config,
    key: ServiceAccountKey,
    cache: Option<Arc<dyn Cache>>,
    context_store: Option<Arc<dyn ContextStore>>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    prompt_cleaner: Option<Arc<dyn PromptCleaner>>
}

impl GptManagerBuilder {
    /// Cache backing the default context manager. Ignored when a context
    /// store is supplied.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn context_store(mut self, context_store: Arc<dyn ContextStore>) -> Self {
        self.context_store = Some(context_store);
        self
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn prompt_cleaner(mut self, prompt_cleaner: Arc<dyn PromptCleaner>) -> Self {
        self.prompt_cleaner = Some(prompt_cleaner);
        self
    }

    pub async fn build(self) -> Result<GptManager, GptError> {
        config::validate(&self.config).map_err(|e| GptError::Configuration {
            message: e.to_string()
        })?;

        let Config {
            gpt,
            context: context_config,
            redis,
            endpoints,
            ..
        } = self.config;

        let credentials = Arc::new(CredentialManager::with_token_url(
            self.key,
            &endpoints.iam_token_url
        )?);

        let context: Arc<dyn ContextStore> = match self.context_store {
            Some(store) => store,
            None => {
                let cache: Arc<dyn Cache> = match self.cache {
                    Some(cache) => cache,
                    None => Arc::new(RedisCache::new(&redis.url).await?)
                };
                Arc::new(ContextManager::from_config(cache, &context_config))
            }
        };

        let model_uri = gpt.model_uri();
        let tokenizer: Arc<dyn Tokenizer> = match self.tokenizer {
            Some(tokenizer) => tokenizer,
            None => Arc::new(HttpTokenizer::new(
                &endpoints.llm_base_url,
                &model_uri,
                context_config.max_tokens
            )?)
        };
        let cleaner: Arc<dyn PromptCleaner> = match self.prompt_cleaner {
            Some(cleaner) => cleaner,
            None => Arc::new(DefaultPromptCleaner::new())
        };

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::Connection {
                reason: e.to_string()
            })?;

        info!(
            model_uri = %model_uri,
            async_mode = gpt.async_mode,
            key_id = %credentials.key_id(),
            "GPT manager ready"
        );

        Ok(GptManager {
            credentials,
            context,
            tokenizer,
            cleaner,
            http_client,
            folder_id: gpt.folder_id,
            model_uri,
            system_message: ChatMessage::new(Role::System, gpt.gpt_role),
            temperature: gpt.temperature,
            max_answer_tokens: gpt.max_answer_tokens,
            async_mode: gpt.async_mode,
            async_timeout: Duration::from_secs(gpt.async_timeout_seconds),
            poll_interval: Duration::from_millis(gpt.poll_interval_ms),
            llm_base_url: endpoints.llm_base_url.trim_end_matches('/').to_string(),
            operation_base_url: endpoints.operation_base_url.trim_end_matches('/').to_string(),
            role_tokens: Mutex::new(None)
        })
    }
}

impl GptManager {
    pub fn builder(config: Config, key: ServiceAccountKey) -> GptManagerBuilder {
        GptManagerBuilder {
            config,
            key,
            cache: None,
            context_store: None,
            tokenizer: None,
            prompt_cleaner: None
        }
    }

    /// Manager with every collaborator at its default.
    pub async fn new(config: Config, key: ServiceAccountKey) -> Result<Self, GptError> {
        Self::builder(config, key).build().await
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    pub fn model_uri(&self) -> &str {
        &self.model_uri
    }

    /// Token cost of the system role, known after [`initialize`](Self::initialize).
    pub async fn role_tokens(&self) -> Option<u32> {
        *self.role_tokens.lock().await
    }

    /// Counts the tokens of the system role text.
    pub async fn initialize(&self) -> Result<(), GptError> {
        let token = self.credentials.get_token().await?;
        let tokens = self
            .tokenizer
            .tokenize(&self.system_message.text, &token)
            .await?;
        *self.role_tokens.lock().await = Some(tokens);
        debug!(role_tokens = tokens, "GPT role tokenized");
        Ok(())
    }

    pub async fn get_context(
        &self,
        session_id: &SessionId
    ) -> Result<Option<Vec<MessageContext>>, GptError> {
        Ok(self.context.get_context(session_id).await?)
    }

    /// Token cost of the request the next prompt would extend: the system
    /// message plus the stored context.
    pub async fn context_tokens(&self, session_id: &SessionId) -> Result<u32, GptError> {
        let token = self.credentials.get_token().await?;
        let context = self
            .context
            .get_context(session_id)
            .await?
            .unwrap_or_default();
        let messages = self.messages(&context);
        Ok(self.tokenizer.tokenize_completion(&messages, &token).await?)
    }

    /// Answers `prompt` within `session_id`.
    ///
    /// Both the cleaned prompt and the answer are appended to the session
    /// context. A failed completion leaves the prompt in the context.
    pub async fn get_answer(&self, prompt: &str, session_id: &SessionId) -> Result<String, GptError> {
        let token = self.credentials.get_token().await?;

        let prompt = self.cleaner.clean(prompt)?;
        let prompt_tokens = self.tokenizer.tokenize(&prompt, &token).await?;
        let context = self
            .context
            .update_context(
                session_id,
                MessageContext::new(Role::User, prompt, prompt_tokens)
            )
            .await?;

        let request = CompletionRequest {
            model_uri: &self.model_uri,
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.temperature,
                max_tokens: self.max_answer_tokens.to_string()
            },
            messages: self.messages(&context)
        };

        let result = if self.async_mode {
            self.complete_async(&request).await?
        } else {
            self.complete_sync(&request).await?
        };
        let (answer, answer_tokens) = result.into_answer()?;

        self.context
            .update_context(
                session_id,
                MessageContext::new(Role::Assistant, answer.clone(), answer_tokens)
            )
            .await?;

        debug!(
            session_id = %session_id,
            prompt_tokens,
            answer_tokens,
            "Answer received"
        );
        Ok(answer)
    }

    fn messages(&self, context: &[MessageContext]) -> Vec<ChatMessage> {
        std::iter::once(self.system_message.clone())
            .chain(context.iter().map(MessageContext::as_message))
            .collect()
    }

    async fn complete_sync(
        &self,
        request: &CompletionRequest<'_>
    ) -> Result<CompletionResult, GptError> {
        let response = self.post_completion("completion", request).await?;
        let body: CompletionBody = response.json().await.map_err(invalid_response)?;
        Ok(body.into_result())
    }

    async fn complete_async(
        &self,
        request: &CompletionRequest<'_>
    ) -> Result<CompletionResult, GptError> {
        let response = self.post_completion("completionAsync", request).await?;
        let accepted: AsyncAccepted = response.json().await.map_err(invalid_response)?;
        debug!(operation_id = %accepted.id, "Completion queued");

        let token = self.credentials.get_token().await?;
        let polled =
            tokio::time::timeout(self.async_timeout, self.poll_operation(&accepted.id, &token))
                .await;
        match polled {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    operation_id = %accepted.id,
                    timeout_secs = self.async_timeout.as_secs(),
                    "Completion operation timed out"
                );
                Err(CompletionError::Timeout {
                    operation_id: accepted.id,
                    timeout_secs: self.async_timeout.as_secs()
                }
                .into())
            }
        }
    }

    async fn post_completion(
        &self,
        endpoint: &str,
        request: &CompletionRequest<'_>
    ) -> Result<Response, GptError> {
        let token = self.credentials.get_token().await?;
        let url = format!("{}/{}", self.llm_base_url, endpoint);

        let mode = if self.async_mode { "async" } else { "sync" };
        metrics::counter!("yagpt_completion_requests_total", "mode" => mode).increment(1);

        let response = self
            .http_client
            .post(&url)
            .header("x-folder-id", &self.folder_id)
            .bearer_auth(&token)
            .json(request)
            .send()
            .await
            .map_err(connection_failed)?;

        Ok(self.check_status(response).await?)
    }

    /// Polls until the operation is done. Sleeps before every check.
    async fn poll_operation(
        &self,
        operation_id: &str,
        token: &str
    ) -> Result<CompletionResult, CompletionError> {
        let url = format!("{}/operations/{}", self.operation_base_url, operation_id);

        loop {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .http_client
                .get(&url)
                .header("x-folder-id", &self.folder_id)
                .bearer_auth(token)
                .send()
                .await
                .map_err(connection_failed)?;
            let response = self.check_status(response).await?;

            let operation: Operation = response.json().await.map_err(invalid_response)?;
            debug!(operation_id, done = operation.done, "Polled completion operation");

            if operation.done {
                return operation.into_result(operation_id);
            }
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("Completion API rejected the IAM token, dropping it");
            self.credentials.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "Completion request failed");
        Err(CompletionError::Request {
            status: status.as_u16(),
            body
        })
    }
}

fn connection_failed(e: reqwest::Error) -> CompletionError {
    error!(error = %e, "Connection to completion API failed");
    CompletionError::Connection {
        reason: e.to_string()
    }
}

fn invalid_response(e: reqwest::Error) -> CompletionError {
    CompletionError::InvalidResponse {
        reason: e.to_string()
    }
}
