//! Shared types for the message processing pipeline.

use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// What kind of payload a chat message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    /// Images, files, audio, locations and anything else without a plain body.
    NonText,
}

/// A chat message handed to the pipeline by the chat session.
///
/// Built once per event by the channel adapter and consumed by a single
/// pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Event ID, used for read receipts and reply threading.
    pub id: String,
    /// Room the message was posted in.
    pub room: String,
    /// Fully-qualified sender identity.
    pub sender: String,
    /// Message body.
    pub body: String,
    pub kind: ContentKind,
}

impl InboundMessage {
    /// Create a text message.
    pub fn text(
        id: impl Into<String>,
        room: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            room: room.into(),
            sender: sender.into(),
            body: body.into(),
            kind: ContentKind::Text,
        }
    }

    /// Mark the message as carrying non-text content.
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }
}

// ── Parsed translation ──────────────────────────────────────────────

/// Which reply shape the translation was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// Hand-delimited `{\n"lang": "he",\n"text": "..."\n}` envelope.
    LegacyEnvelope,
    /// Real JSON object with `lang` and `text`.
    JsonEnvelope,
    /// Content block that already arrived as a structured object.
    StructuredBlock,
    /// The model answered in prose.
    PlainText,
}

/// Translation text extracted from a provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTranslation {
    pub text: String,
    /// Declared language code, when the reply carried a validated one.
    pub language: Option<String>,
    pub format: ReplyFormat,
}

// ── Outcomes ────────────────────────────────────────────────────────

/// Result of running a message through filter → translate.
///
/// Exactly one variant per processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A filter keyword matched; a notice naming it was posted.
    Suppressed { matched_keyword: String },
    /// The translation was posted as a threaded reply.
    Translated { text: String },
    /// Something failed; a generic notice was posted and detail logged.
    Failed { reason: String },
}

impl PipelineOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Suppressed { .. } => "suppressed",
            Self::Translated { .. } => "translated",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Why a message never entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sent by the bot itself.
    OwnMessage,
    EmptyBody,
}

/// Everything the processor can do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Ignored silently, no side effects.
    Skipped(SkipReason),
    /// Non-text content; a "text only" notice was posted.
    Unsupported,
    /// An admin command was handled; holds the notice that was posted.
    Command { notice: String },
    /// The message went through the pipeline.
    Processed(PipelineOutcome),
}
