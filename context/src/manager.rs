use crate::eviction::evict_for;
use async_trait::async_trait;
use errors::ContextError;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};
use yc_core::{Cache, ContextStore, MessageContext, SessionId};

pub const DEFAULT_MAX_CONTEXT_MESSAGES: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 7500;

/// Lifetime of a stored context, refreshed on every update.
pub const CONTEXT_TTL_SECONDS: u64 = 3600;

/// Per-session conversation history stored in a [`Cache`].
///
/// Read-modify-write is not serialized per session: two concurrent updates of
/// the same session may race and the last write wins.
pub struct ContextManager {
    cache: Arc<dyn Cache>,
    max_context_messages: usize,
    max_tokens: u32
}

impl ContextManager {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_limits(cache, DEFAULT_MAX_CONTEXT_MESSAGES, DEFAULT_MAX_TOKENS)
    }

    pub fn with_limits(cache: Arc<dyn Cache>, max_context_messages: usize, max_tokens: u32) -> Self {
        Self {
            cache,
            max_context_messages,
            max_tokens
        }
    }

    pub fn from_config(cache: Arc<dyn Cache>, config: &config::ContextConfig) -> Self {
        Self::with_limits(cache, config.max_context_messages, config.max_tokens)
    }

    pub fn max_context_messages(&self) -> usize {
        self.max_context_messages
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    async fn load(&self, session_id: &SessionId) -> Result<Option<Vec<MessageContext>>, ContextError> {
        let key = session_id.context_key();
        let raw = self
            .cache
            .get(&key)
            .await
            .map_err(|source| ContextError::Cache {
                session_id: session_id.to_string(),
                source
            })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<MessageContext>>(&raw) {
            Ok(context) => Ok(Some(context)),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Stored context is not decodable, treating as empty"
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ContextStore for ContextManager {
    async fn get_context(
        &self,
        session_id: &SessionId
    ) -> Result<Option<Vec<MessageContext>>, ContextError> {
        self.load(session_id).await
    }

    async fn update_context(
        &self,
        session_id: &SessionId,
        new_message: MessageContext
    ) -> Result<Vec<MessageContext>, ContextError> {
        let mut context: VecDeque<MessageContext> =
            self.load(session_id).await?.unwrap_or_default().into();

        let evictions = evict_for(
            &mut context,
            new_message.tokens,
            self.max_context_messages,
            self.max_tokens
        );
        if evictions.by_count > 0 {
            metrics::counter!("yagpt_context_evicted_total", "reason" => "count")
                .increment(evictions.by_count as u64);
        }
        if evictions.by_tokens > 0 {
            metrics::counter!("yagpt_context_evicted_total", "reason" => "tokens")
                .increment(evictions.by_tokens as u64);
        }

        context.push_back(new_message);
        let context: Vec<MessageContext> = context.into();

        let serialized =
            serde_json::to_string(&context).map_err(|e| ContextError::Serialization {
                session_id: session_id.to_string(),
                reason: e.to_string()
            })?;

        self.cache
            .set(&session_id.context_key(), &serialized, CONTEXT_TTL_SECONDS)
            .await
            .map_err(|source| ContextError::Cache {
                session_id: session_id.to_string(),
                source
            })?;

        debug!(
            session_id = %session_id,
            entries = context.len(),
            evicted = evictions.total(),
            "Context updated"
        );

        Ok(context)
    }
}
