//! Bounded conversation context for YandexGPT sessions.
//!
//! Each session keeps an ordered list of [`MessageContext`] entries in the
//! cache under `context:{session_id}`. Every update enforces two limits by
//! dropping the oldest entries before the new one is appended:
//!
//! 1. the entry count stays below `max_context_messages`
//! 2. the cumulative token cost stays below `max_tokens`
//!
//! The new entry itself is never evicted, so a single oversized message is
//! stored as the only entry of its session.
//!
//! # Example
//!
//! ```rust,ignore
//! use context::ContextManager;
//! use yc_core::{ContextStore, MessageContext, Role, SessionId};
//!
//! let manager = ContextManager::new(cache);
//! let session = SessionId::new("chat-1").unwrap();
//! let context = manager
//!     .update_context(&session, MessageContext::new(Role::User, "Hi", 2))
//!     .await?;
//! ```
//!
//! [`MessageContext`]: yc_core::MessageContext

mod eviction;
mod manager;

pub use eviction::{Evictions, evict_for};
pub use manager::{
    CONTEXT_TTL_SECONDS, ContextManager, DEFAULT_MAX_CONTEXT_MESSAGES, DEFAULT_MAX_TOKENS
};
