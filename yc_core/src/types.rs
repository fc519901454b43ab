use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a message in a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User
}

/// One entry of a session context.
///
/// Entries are immutable once appended: the context manager only ever drops
/// whole entries from the head of the list and appends new ones at the tail.
/// The serialized shape `{"role", "text", "tokens"}` is the cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub role: Role,
    pub text: String,
    pub tokens: u32
}

impl MessageContext {
    pub fn new(role: Role, text: impl Into<String>, tokens: u32) -> Self {
        Self {
            role,
            text: text.into(),
            tokens
        }
    }

    /// Strips the token cost, leaving the message as the completion API
    /// expects it.
    pub fn as_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            text: self.text.clone()
        }
    }
}

/// A message as sent to the completion and tokenization endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into()
        }
    }
}

/// Opaque identifier scoping one independent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key holding the serialized context of this session.
    pub fn context_key(&self) -> String {
        format!("context:{}", self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| "session id must not be empty".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_message_context_wire_shape() {
        let msg = MessageContext::new(Role::User, "hello", 3);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "role": "user", "text": "hello", "tokens": 3 })
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
        assert_eq!(Role::System.to_string(), "system");
        assert!(Role::from_str("moderator").is_err());
    }

    #[test]
    fn test_session_id_context_key() {
        let id = SessionId::from_str("chat-42").unwrap();
        assert_eq!(id.context_key(), "context:chat-42");
        assert!(SessionId::new("").is_none());
    }

    #[test]
    fn test_as_message_drops_token_cost() {
        let msg = MessageContext::new(Role::Assistant, "answer", 12);
        let json = serde_json::to_value(msg.as_message()).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "text": "answer" }));
    }
}
