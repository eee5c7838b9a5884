//! Configuration, sourced from the environment (optionally via `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::channels::MatrixConfig;
use crate::error::ConfigError;
use crate::llm::AnthropicConfig;
use crate::pipeline::{ProcessorConfig, TokenBudget, TranslatorConfig};

const DEFAULT_DB_PATH: &str = "./data/filter.db";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TYPING_SECS: u64 = 5;

/// Everything the binary needs to wire the bot together.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub matrix: MatrixConfig,
    /// Sender allowed to run `!add` / `!remove`.
    pub admin_user_id: Option<String>,
    pub anthropic: AnthropicConfig,
    pub translator: TranslatorConfig,
    pub db_path: PathBuf,
    pub typing_ttl: Duration,
}

impl BotConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let matrix = MatrixConfig {
            homeserver: require("MATRIX_SERVER")?,
            access_token: SecretString::from(require("MATRIX_ACCESS_TOKEN")?),
            user_id: require("MATRIX_USER_ID")?,
        };

        let mut anthropic = AnthropicConfig::new(SecretString::from(require("ANTHROPIC_API_KEY")?));
        if let Some(base_url) = get("ANTHROPIC_BASE_URL") {
            anthropic.base_url = base_url;
        }
        if let Some(version) = get("ANTHROPIC_VERSION") {
            anthropic.api_version = version;
        }
        anthropic.timeout = Duration::from_secs(parse_or(
            "TRANSLATE_BOT_TIMEOUT_SECS",
            get("TRANSLATE_BOT_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?);

        let mut translator = TranslatorConfig::default();
        if let Some(model) = get("TRANSLATE_BOT_MODEL") {
            translator.model = model;
        }
        if let Some(prompt) = get("TRANSLATE_BOT_SYSTEM_PROMPT") {
            translator.system_prompt = prompt;
        }
        translator.token_budget = parse_or(
            "TRANSLATE_BOT_TOKEN_BUDGET",
            get("TRANSLATE_BOT_TOKEN_BUDGET"),
            TokenBudget::default(),
        )?;
        translator.temperature = get("TRANSLATE_BOT_TEMPERATURE")
            .map(|v| parse_value::<f32>("TRANSLATE_BOT_TEMPERATURE", &v))
            .transpose()?;

        let typing_secs = parse_or(
            "TRANSLATE_BOT_TYPING_SECS",
            get("TRANSLATE_BOT_TYPING_SECS"),
            DEFAULT_TYPING_SECS,
        )?;

        Ok(Self {
            matrix,
            admin_user_id: get("ADMIN_USER_ID"),
            anthropic,
            translator,
            db_path: PathBuf::from(
                get("TRANSLATE_BOT_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            typing_ttl: Duration::from_secs(typing_secs),
        })
    }

    /// Settings for the message processor.
    pub fn processor_config(&self) -> ProcessorConfig {
        let mut config = ProcessorConfig::new(&self.matrix.user_id);
        config.admin_user_id = self.admin_user_id.clone();
        config.typing_ttl = self.typing_ttl;
        config
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}
