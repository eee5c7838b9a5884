//! Error types for the translate bot.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Keyword store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Chat session errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Translation provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned {status} {error_type}: {message}")]
    Api {
        provider: String,
        status: u16,
        error_type: String,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors raised while processing a single inbound message.
///
/// Every variant is recovered inside the pipeline; none of them stop the bot.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Translation provider failed: {0}")]
    ProviderFailure(#[from] LlmError),

    #[error("Translation provider returned no text content")]
    EmptyReply,

    #[error("Translation declared language '{found}', expected '{expected}'")]
    WrongLanguage { expected: String, found: String },

    #[error("Filter pattern '{pattern}' is not a valid regex: {reason}")]
    MalformedRule { pattern: String, reason: String },

    #[error("Only text messages can be translated")]
    UnsupportedContent,

    #[error("Keyword store unavailable: {0}")]
    KeywordStore(#[from] DatabaseError),
}

impl PipelineError {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProviderFailure(_) => "provider_failure",
            Self::EmptyReply => "empty_reply",
            Self::WrongLanguage { .. } => "wrong_language",
            Self::MalformedRule { .. } => "malformed_rule",
            Self::UnsupportedContent => "unsupported_content",
            Self::KeywordStore(_) => "keyword_store",
        }
    }
}
