//! The completion request: an ordered list of role-tagged messages.
//!
//! A [`Request`] is immutable once built. Its [`Request::fingerprint`] is a
//! SHA-256 over a canonical JSON serialisation (object keys in sorted order,
//! UTF-8, no insignificant whitespace), so two requests with the same
//! role/content sequence always map to the same cache entry no matter when
//! or how they were assembled.

use edgequake_llm::ChatMessage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => f.write_str("system"),
            Role::User => f.write_str("user"),
        }
    }
}

/// One role-tagged message.
// Fields are declared in sorted key order; the fingerprint depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub role: Role,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::System,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::User,
        }
    }

    fn to_chat(&self) -> ChatMessage {
        match self.role {
            Role::System => ChatMessage::system(self.content.as_str()),
            Role::User => ChatMessage::user(self.content.as_str()),
        }
    }
}

/// An immutable, ordered message list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    messages: Vec<Message>,
}

impl Request {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Total characters across all message contents.
    pub fn content_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }

    /// Canonical serialisation the fingerprint is computed over.
    pub fn canonical_json(&self) -> String {
        // Vec<Message> of plain strings cannot fail to serialise.
        serde_json::to_string(&self.messages).unwrap_or_default()
    }

    /// Lower-case hex SHA-256 of [`Request::canonical_json`].
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_json().as_bytes()))
    }

    /// Convert into the provider message type.
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_chat).collect()
    }
}
