//! # YandexGPT Client Errors
//!
//! One error enum per component, plus [`GptError`] which aggregates them for
//! callers of the completion manager.
//!
//! Every variant carries the context needed to act on it (key identifier,
//! HTTP status and body, session identifier, operation identifier). None of
//! these errors are recovered inside the library.

use thiserror::Error;

/// Service-account credential and IAM token errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid service account key {key_id}: {reason}")]
    InvalidCredential { key_id: String, reason: String },

    #[error("IAM token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Connection to IAM token endpoint failed: {reason}")]
    Connection { reason: String },

    #[error("Malformed IAM token response: {reason}")]
    MalformedResponse { reason: String }
}

/// Key-value cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Connection to {backend} failed: {reason}")]
    Connectivity { backend: String, reason: String }
}

/// Session context errors
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Cache unavailable for session {session_id}: {source}")]
    Cache {
        session_id: String,
        #[source]
        source: CacheError
    },

    #[error("Failed to serialize context of session {session_id}: {reason}")]
    Serialization { session_id: String, reason: String }
}

/// Token-counting service errors
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Tokenization failed with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection to tokenizer failed: {reason}")]
    Connection { reason: String },

    #[error("Malformed tokenizer response: {reason}")]
    MalformedResponse { reason: String }
}

/// Completion endpoint errors
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed with {status}: {body}")]
    Request { status: u16, body: String },

    #[error("Connection to completion API failed: {reason}")]
    Connection { reason: String },

    #[error("Completion operation {operation_id} not done after {timeout_secs}s")]
    Timeout {
        operation_id: String,
        timeout_secs: u64
    },

    #[error("Invalid completion response: {reason}")]
    InvalidResponse { reason: String }
}

/// Prompt sanitization errors
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt is empty or consists only of forbidden characters")]
    EmptyInput
}

/// Errors surfaced by the completion manager
#[derive(Debug, Error)]
pub enum GptError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Configuration error: {message}")]
    Configuration { message: String }
}

impl GptError {
    /// HTTP status reported by a remote endpoint, if the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(AuthError::TokenEndpoint { status, .. })
            | Self::Tokenizer(TokenizerError::Status { status, .. })
            | Self::Completion(CompletionError::Request { status, .. }) => Some(*status),
            _ => None
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Completion(CompletionError::Timeout { .. }))
    }
}
