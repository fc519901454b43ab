use async_trait::async_trait;
use auth::ServiceAccountKey;
use config::Config;
use errors::{CompletionError, GptError, PromptError, TokenizerError};
use gpt::GptManager;
use serde_json::{Value, json};
use std::sync::Arc;
use storage::InMemoryCache;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yc_core::{ChatMessage, ContextStore, MessageContext, PromptCleaner, Role, SessionId, Tokenizer};

const PRIVATE_KEY: &str = include_str!("fixtures/test_key.pem");
const LLM_PATH: &str = "/foundationModels/v1";
const ROLE: &str = "You are a helpful assistant";

fn service_account_key() -> ServiceAccountKey {
    ServiceAccountKey {
        id: Some("ajekeyid".to_string()),
        service_account_id: Some("ajeserviceaccount".to_string()),
        created_at: Some("2024-05-01T10:00:00Z".to_string()),
        key_algorithm: Some("RSA_2048".to_string()),
        public_key: Some("-----BEGIN PUBLIC KEY-----".to_string()),
        private_key: Some(PRIVATE_KEY.to_string())
    }
}

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.gpt.folder_id = "b1gfolder".to_string();
    config.gpt.gpt_role = ROLE.to_string();
    config.gpt.poll_interval_ms = 50;
    config.endpoints.iam_token_url = format!("{}/iam/v1/tokens", server.uri());
    config.endpoints.llm_base_url = format!("{}{}", server.uri(), LLM_PATH);
    config.endpoints.operation_base_url = server.uri();
    config
}

async fn manager_for(server: &MockServer, config: Config) -> GptManager {
    GptManager::builder(config, service_account_key())
        .cache(Arc::new(InMemoryCache::new()))
        .build()
        .await
        .unwrap()
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/iam/v1/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "iamToken": "t1.iam",
            "expiresIn": 43200
        })))
        .mount(server)
        .await;
}

async fn mount_tokenize(server: &MockServer, count: usize) {
    let tokens: Vec<Value> = (0..count).map(|i| json!({ "id": i.to_string() })).collect();
    Mock::given(method("POST"))
        .and(path(format!("{}/tokenize", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokens": tokens })))
        .mount(server)
        .await;
}

fn completion_result(text: &str, completion_tokens: Value) -> Value {
    json!({
        "alternatives": [
            { "message": { "role": "assistant", "text": text }, "status": "ALTERNATIVE_STATUS_FINAL" }
        ],
        "usage": { "inputTextTokens": "12", "completionTokens": completion_tokens, "totalTokens": "14" },
        "modelVersion": "23.10.2024"
    })
}

fn session(id: &str) -> SessionId {
    SessionId::new(id).unwrap()
}

#[tokio::test]
async fn test_sync_answer_is_recorded_in_context() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 3).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .and(header("x-folder-id", "b1gfolder"))
        .and(header("authorization", "Bearer t1.iam"))
        .and(body_partial_json(json!({
            "modelUri": "gpt://b1gfolder/yandexgpt-lite/latest",
            "completionOptions": { "stream": false, "maxTokens": "500" },
            "messages": [
                { "role": "system", "text": ROLE },
                { "role": "user", "text": "What is the capital of France?" }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": completion_result("Paris", json!("2")) }))
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-sync");

    let answer = manager
        .get_answer("What is the capital of France?", &session)
        .await
        .unwrap();
    assert_eq!(answer, "Paris");

    let context = manager.get_context(&session).await.unwrap().unwrap();
    assert_eq!(
        context,
        vec![
            MessageContext::new(Role::User, "What is the capital of France?", 3),
            MessageContext::new(Role::Assistant, "Paris", 2)
        ]
    );
}

#[tokio::test]
async fn test_follow_up_carries_previous_turns() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "text": ROLE },
                { "role": "user", "text": "Hi" },
                { "role": "assistant", "text": "Hello" },
                { "role": "user", "text": "Again" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_result("Sure", json!(1))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_result("Hello", json!(1))))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-follow-up");

    assert_eq!(manager.get_answer("Hi", &session).await.unwrap(), "Hello");
    assert_eq!(manager.get_answer("Again", &session).await.unwrap(), "Sure");
}

#[tokio::test]
async fn test_prompt_is_cleaned_before_storage() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_result("Hey", json!("1"))))
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-clean");

    manager.get_answer("  Hello 👋   there!!  ", &session).await.unwrap();

    let context = manager.get_context(&session).await.unwrap().unwrap();
    assert_eq!(context[0].text, "Hello there!!");
}

#[tokio::test]
async fn test_empty_prompt_rejected_before_tokenization() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tokenize", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokens": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-empty");

    assert!(matches!(
        manager.get_answer("🔥 $$$", &session).await,
        Err(GptError::Prompt(PromptError::EmptyInput))
    ));
    assert_eq!(manager.get_context(&session).await.unwrap(), None);
}

#[tokio::test]
async fn test_completion_failure_keeps_prompt_in_context() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-failure");

    let err = manager.get_answer("Hi", &session).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(
        err,
        GptError::Completion(CompletionError::Request { ref body, .. }) if body == "internal"
    ));

    let context = manager.get_context(&session).await.unwrap().unwrap();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].role, Role::User);
}

#[tokio::test]
async fn test_unauthorized_completion_drops_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;

    let err = manager.get_answer("Hi", &session("chat-401")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(manager.credentials().expires_at().await.is_none());
}

#[tokio::test]
async fn test_tokenizer_failure_propagates() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tokenize", LLM_PATH)))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    let session = session("chat-tokenizer");

    assert!(matches!(
        manager.get_answer("Hi", &session).await,
        Err(GptError::Tokenizer(TokenizerError::Status { status: 429, .. }))
    ));
    assert_eq!(manager.get_context(&session).await.unwrap(), None);
}

#[tokio::test]
async fn test_async_answer_after_polling() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 2).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completionAsync", LLM_PATH)))
        .and(header("x-folder-id", "b1gfolder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "op-123",
            "description": "Async GPT Completion",
            "done": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "op-123", "done": false })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-123"))
        .and(header("authorization", "Bearer t1.iam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "op-123",
            "done": true,
            "response": completion_result("Async Paris", json!("4"))
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.gpt.async_mode = true;
    let manager = manager_for(&server, config).await;
    let session = session("chat-async");

    assert_eq!(manager.get_answer("Capital?", &session).await.unwrap(), "Async Paris");

    let context = manager.get_context(&session).await.unwrap().unwrap();
    assert_eq!(context[1], MessageContext::new(Role::Assistant, "Async Paris", 4));
}

#[tokio::test]
async fn test_async_timeout_reports_operation_id() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completionAsync", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "op-slow", "done": false })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "op-slow", "done": false })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.gpt.async_mode = true;
    config.gpt.async_timeout_seconds = 1;
    config.gpt.poll_interval_ms = 100;
    let manager = manager_for(&server, config).await;

    let err = manager.get_answer("Hi", &session("chat-timeout")).await.unwrap_err();
    assert!(err.is_timeout());
    match err {
        GptError::Completion(CompletionError::Timeout {
            operation_id,
            timeout_secs
        }) => {
            assert_eq!(operation_id, "op-slow");
            assert_eq!(timeout_secs, 1);
        }
        other => panic!("expected Timeout, got {other:?}")
    }
}

#[tokio::test]
async fn test_failed_poll_is_a_request_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_tokenize(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completionAsync", LLM_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "op-gone" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("operation not found"))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.gpt.async_mode = true;
    let manager = manager_for(&server, config).await;

    let err = manager.get_answer("Hi", &session("chat-poll")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_initialize_counts_role_tokens() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tokenize", LLM_PATH)))
        .and(body_partial_json(json!({ "text": ROLE })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tokens": [{ "id": "1" }, { "id": "2" }, { "id": "3" }, { "id": "4" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    assert_eq!(manager.role_tokens().await, None);

    manager.initialize().await.unwrap();
    assert_eq!(manager.role_tokens().await, Some(4));
}

#[tokio::test]
async fn test_context_tokens_include_system_message() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tokenizeCompletion", LLM_PATH)))
        .and(body_partial_json(json!({
            "completionOptions": { "stream": false, "maxTokens": 7500 },
            "messages": [{ "role": "system", "text": ROLE }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tokens": [{ "id": "1" }, { "id": "2" }, { "id": "3" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server, config_for(&server)).await;
    assert_eq!(
        manager.context_tokens(&session("chat-count")).await.unwrap(),
        3
    );
}

struct ShoutingCleaner;

impl PromptCleaner for ShoutingCleaner {
    fn clean(&self, prompt: &str) -> Result<String, PromptError> {
        Ok(prompt.to_uppercase())
    }
}

struct FixedTokenizer(u32);

#[async_trait]
impl Tokenizer for FixedTokenizer {
    async fn tokenize(&self, _text: &str, _iam_token: &str) -> Result<u32, TokenizerError> {
        Ok(self.0)
    }

    async fn tokenize_completion(
        &self,
        messages: &[ChatMessage],
        _iam_token: &str
    ) -> Result<u32, TokenizerError> {
        Ok(self.0 * messages.len() as u32)
    }
}

#[tokio::test]
async fn test_custom_collaborators_are_used() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/completion", LLM_PATH)))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "text": ROLE },
                { "role": "user", "text": "HELLO 👋" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_result("hi", json!("1"))))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(context::ContextManager::new(Arc::new(InMemoryCache::new())));
    let manager = GptManager::builder(config_for(&server), service_account_key())
        .context_store(store.clone())
        .tokenizer(Arc::new(FixedTokenizer(11)))
        .prompt_cleaner(Arc::new(ShoutingCleaner))
        .build()
        .await
        .unwrap();
    let session = session("chat-custom");

    manager.get_answer("hello 👋", &session).await.unwrap();

    let context = store.get_context(&session).await.unwrap().unwrap();
    assert_eq!(context[0], MessageContext::new(Role::User, "HELLO 👋", 11));
    assert_eq!(manager.context_tokens(&session).await.unwrap(), 33);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.gpt.folder_id = String::new();

    let result = GptManager::builder(config, service_account_key())
        .cache(Arc::new(InMemoryCache::new()))
        .build()
        .await;
    assert!(matches!(result, Err(GptError::Configuration { .. })));
}
