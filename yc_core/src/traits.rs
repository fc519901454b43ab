//! Capability traits for the collaborators of the context and completion
//! managers.

use crate::types::{ChatMessage, MessageContext, SessionId};
use async_trait::async_trait;
use errors::{CacheError, ContextError, PromptError, TokenizerError};

/// String-keyed cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;
}

/// Per-session conversation history.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Returns the stored context of a session, or `None` when there is none
    /// (or it cannot be read back).
    async fn get_context(
        &self,
        session_id: &SessionId
    ) -> Result<Option<Vec<MessageContext>>, ContextError>;

    /// Appends `new_message` to the session context, evicting the oldest
    /// entries as needed, and returns the stored result.
    async fn update_context(
        &self,
        session_id: &SessionId,
        new_message: MessageContext
    ) -> Result<Vec<MessageContext>, ContextError>;
}

/// Counts the model-specific token cost of text.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    async fn tokenize(&self, text: &str, iam_token: &str) -> Result<u32, TokenizerError>;

    async fn tokenize_completion(
        &self,
        messages: &[ChatMessage],
        iam_token: &str
    ) -> Result<u32, TokenizerError>;
}

/// Sanitizes user prompts before they are priced and sent.
pub trait PromptCleaner: Send + Sync {
    fn clean(&self, prompt: &str) -> Result<String, PromptError>;
}
