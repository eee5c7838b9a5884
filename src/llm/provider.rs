//! Translation provider boundary — request/response wire types and the
//! provider trait.
//!
//! The shapes follow the Messages API: a request carries a model, a system
//! instruction, user messages made of content blocks and a token budget; a
//! reply carries a list of content blocks plus usage counters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

// ── Request ─────────────────────────────────────────────────────────

/// Conversation role of a request message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// Content block inside a request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestContent {
    Text { text: String },
}

/// A single request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<RequestContent>,
}

impl Message {
    /// A user message with one text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![RequestContent::Text { text: text.into() }],
        }
    }
}

/// Request sent to the translation provider. Built fresh for every message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl TranslationRequest {
    /// Text of the first user content block, if any.
    pub fn user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .flat_map(|m| m.content.iter())
            .map(|c| match c {
                RequestContent::Text { text } => text.as_str(),
            })
            .next()
    }
}

// ── Reply ───────────────────────────────────────────────────────────

/// Marker for `"type": "text"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTag {
    Text,
}

/// `{"type": "text", "text": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub kind: TextTag,
    pub text: String,
}

/// `{"lang": "he", "text": ...}` delivered directly as a content block.
///
/// `text` is kept as a raw JSON value; it is usually a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedBlock {
    pub lang: String,
    pub text: serde_json::Value,
}

/// One entry of a reply's `content` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text(TextBlock),
    Tagged(TaggedBlock),
    /// Any other block type (tool use, thinking, ...). Carries no translation.
    Other(serde_json::Value),
}

impl ContentBlock {
    /// A plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock {
            kind: TextTag::Text,
            text: text.into(),
        })
    }
}

/// Token usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Successful provider reply. Only the first content block is consumed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationReply {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl TranslationReply {
    /// Reply with the given content blocks and empty metadata.
    pub fn from_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }
}

/// Error body returned alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

// ── Provider trait ──────────────────────────────────────────────────

/// Call-and-response capability used by the translation invoker.
///
/// Implementations own transport concerns, including the per-call timeout.
/// One call per message; callers never retry.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Send one request and wait for the reply.
    async fn create_message(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationReply, LlmError>;
}
