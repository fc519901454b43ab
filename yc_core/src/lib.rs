//! # YandexGPT Client Core
//!
//! Shared types and capability traits for the YandexGPT client.
//!
//! This crate provides:
//! - Conversation message types stored in the session context
//! - Capability traits for the cache, context store, tokenizer and prompt
//!   cleaner collaborators
//!
//! Concrete implementations live in the `storage`, `context` and `gpt`
//! crates.

pub mod traits;
pub mod types;

pub use traits::{Cache, ContextStore, PromptCleaner, Tokenizer};
pub use types::{ChatMessage, MessageContext, Role, SessionId};
