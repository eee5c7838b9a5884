//! Response parser — extracts the translated text from a provider reply.
//!
//! The model's answer format has changed over time, so the first content
//! block is probed with an ordered chain of pure attempts:
//! 1. the hand-delimited legacy envelope,
//! 2. a real JSON `{"lang", "text"}` object,
//! 3. the same object wrapped in a markdown code fence,
//! 4. plain prose, which always succeeds.
//!
//! Decoding failures only move on to the next attempt; nothing here panics
//! on malformed or partial JSON.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::PipelineError;
use crate::llm::provider::{ContentBlock, TaggedBlock, TranslationReply};
use crate::pipeline::types::{ParsedTranslation, ReplyFormat};

const LEGACY_PREFIX: &str = "{\n\"lang\": \"he\",\n\"text\": \"";
const LEGACY_SUFFIX: &str = "\"\n}";

/// Parses provider replies and enforces the target language.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    target_language: String,
}

impl ResponseParser {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
        }
    }

    /// Extract the translation from the first content block of `reply`.
    pub fn parse(&self, reply: &TranslationReply) -> Result<ParsedTranslation, PipelineError> {
        let parsed = match reply.content.first() {
            Some(ContentBlock::Text(block)) => parse_text(&block.text),
            Some(ContentBlock::Tagged(block)) => from_tagged_block(block),
            Some(ContentBlock::Other(_)) | None => return Err(PipelineError::EmptyReply),
        };
        self.validate(parsed)
    }

    fn validate(&self, parsed: ParsedTranslation) -> Result<ParsedTranslation, PipelineError> {
        if let Some(ref lang) = parsed.language
            && *lang != self.target_language
        {
            return Err(PipelineError::WrongLanguage {
                expected: self.target_language.clone(),
                found: lang.clone(),
            });
        }

        if parsed.text.trim().is_empty() {
            return Err(PipelineError::EmptyReply);
        }

        Ok(parsed)
    }
}

/// Run the attempt chain over a raw text block. Never fails.
pub fn parse_text(raw: &str) -> ParsedTranslation {
    legacy_envelope(raw)
        .or_else(|| json_envelope(raw))
        .or_else(|| fenced_json_envelope(raw))
        .unwrap_or_else(|| plain_text(raw))
}

/// `{\n"lang": "he",\n"text": "<verbatim>"\n}` — no unescaping, no tag check.
fn legacy_envelope(raw: &str) -> Option<ParsedTranslation> {
    let inner = raw
        .strip_prefix(LEGACY_PREFIX)?
        .strip_suffix(LEGACY_SUFFIX)?;
    Some(ParsedTranslation {
        text: inner.to_string(),
        language: None,
        format: ReplyFormat::LegacyEnvelope,
    })
}

#[derive(Deserialize)]
struct Envelope<'a> {
    lang: String,
    #[serde(borrow)]
    text: &'a RawValue,
}

/// `{"lang": "..", "text": ..}`. A non-string `text` is kept as raw JSON.
fn json_envelope(raw: &str) -> Option<ParsedTranslation> {
    let envelope: Envelope<'_> = serde_json::from_str(raw).ok()?;
    let raw_text = envelope.text.get();
    let text = serde_json::from_str::<String>(raw_text).unwrap_or_else(|_| raw_text.to_string());
    Some(ParsedTranslation {
        text,
        language: Some(envelope.lang.trim().to_string()),
        format: ReplyFormat::JsonEnvelope,
    })
}

/// The JSON envelope inside a ```` ``` ```` / ```` ```json ```` fence.
fn fenced_json_envelope(raw: &str) -> Option<ParsedTranslation> {
    let body = raw.trim().strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string (e.g. `json`) on the opening fence line.
    let (_, inner) = body.split_once('\n')?;
    json_envelope(inner.trim())
}

fn plain_text(raw: &str) -> ParsedTranslation {
    ParsedTranslation {
        text: raw.to_string(),
        language: None,
        format: ReplyFormat::PlainText,
    }
}

fn from_tagged_block(block: &TaggedBlock) -> ParsedTranslation {
    let text = match &block.text {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ParsedTranslation {
        text,
        language: Some(block.lang.trim().to_string()),
        format: ReplyFormat::StructuredBlock,
    }
}
