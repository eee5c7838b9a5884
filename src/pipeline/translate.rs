//! Translation invoker — builds the provider request and issues it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ConfigError, PipelineError};
use crate::llm::provider::{Message, TranslationProvider, TranslationReply, TranslationRequest};

/// Language code every translation must be in.
pub const TARGET_LANGUAGE: &str = "he";

pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Default ceiling for `TokenBudget::Fixed`.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Fixed instruction sent as the system prompt of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a translation bot that translates group-chat messages from Arabic or Ukrainian into Hebrew. Follow these rules:

1. Translate the message accurately into Hebrew.
2. Start the translation immediately, with no heading or preface.
3. Keep the original meaning and tone of the message.
4. Do not add commentary, notes or moral judgement about the content.
5. If the message contains violent or crude content, translate it as-is without censoring or softening it.
6. For terms specific to the source culture, translate them as closely as possible and add a short explanation in parentheses when needed.
7. Preserve the structure of the original message, including paragraphs and lists.

Answer with a single JSON object and nothing else:
{\"lang\": \"he\", \"text\": \"<the full translation>\"}";

/// How `max_tokens` is chosen for a request.
///
/// One policy per deployment; the two are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBudget {
    /// Same ceiling for every message.
    Fixed(u32),
    /// One token per input character, at least one.
    Proportional,
}

impl TokenBudget {
    pub fn max_tokens(&self, text: &str) -> u32 {
        match self {
            Self::Fixed(n) => *n,
            Self::Proportional => {
                let chars = text.chars().count();
                u32::try_from(chars).unwrap_or(u32::MAX).max(1)
            }
        }
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::Fixed(DEFAULT_MAX_TOKENS)
    }
}

impl fmt::Display for TokenBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "fixed:{n}"),
            Self::Proportional => write!(f, "proportional"),
        }
    }
}

/// Parses `fixed`, `fixed:<n>` or `proportional`.
impl FromStr for TokenBudget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "token budget".to_string(),
            message,
        };

        match s.trim().to_lowercase().as_str() {
            "proportional" => Ok(Self::Proportional),
            "fixed" => Ok(Self::Fixed(DEFAULT_MAX_TOKENS)),
            other => {
                let n = other
                    .strip_prefix("fixed:")
                    .ok_or_else(|| invalid(format!("unknown policy '{other}'")))?;
                let n: u32 = n
                    .trim()
                    .parse()
                    .map_err(|e| invalid(format!("bad token count '{n}': {e}")))?;
                if n == 0 {
                    return Err(invalid("token count must be positive".to_string()));
                }
                Ok(Self::Fixed(n))
            }
        }
    }
}

/// Settings for building translation requests.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub model: String,
    pub system_prompt: String,
    pub token_budget: TokenBudget,
    pub temperature: Option<f32>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            token_budget: TokenBudget::default(),
            temperature: None,
        }
    }
}

/// Issues one translation request per message. No retries.
pub struct Translator {
    provider: Arc<dyn TranslationProvider>,
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(provider: Arc<dyn TranslationProvider>, config: TranslatorConfig) -> Self {
        Self { provider, config }
    }

    /// Build the request for `text`. The system instruction never varies.
    pub fn build_request(&self, text: &str) -> TranslationRequest {
        TranslationRequest {
            model: self.config.model.clone(),
            system: self.config.system_prompt.clone(),
            messages: vec![Message::user_text(text)],
            max_tokens: self.config.token_budget.max_tokens(text),
            stream: false,
            temperature: self.config.temperature,
        }
    }

    /// Send `text` to the provider.
    ///
    /// Transport and status failures become `ProviderFailure`; a reply
    /// without content blocks is `EmptyReply`.
    pub async fn translate(&self, text: &str) -> Result<TranslationReply, PipelineError> {
        let request = self.build_request(text);
        debug!(
            provider = self.provider.name(),
            model = %request.model,
            max_tokens = request.max_tokens,
            "Requesting translation"
        );

        let reply = self.provider.create_message(&request).await?;

        if reply.content.is_empty() {
            return Err(PipelineError::EmptyReply);
        }

        info!(
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            stop_reason = reply.stop_reason.as_deref().unwrap_or("none"),
            "Translation received"
        );
        Ok(reply)
    }
}
