//! Anthropic Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{ErrorResponse, TranslationProvider, TranslationReply, TranslationRequest};

const PROVIDER: &str = "anthropic";

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Connection settings for the Anthropic API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: SecretString,
    pub api_version: String,
    pub base_url: String,
    /// Whole-request timeout. Expiry surfaces as `LlmError::RequestFailed`.
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP client for `POST /v1/messages`.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: SecretString,
    api_version: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key,
            api_version: config.api_version,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl TranslationProvider for AnthropicClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn create_message(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationReply, LlmError> {
        debug!(model = %request.model, max_tokens = request.max_tokens, "Sending request to Anthropic");

        let resp = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Anthropic API error");
            return Err(api_error(status.as_u16(), &body));
        }

        resp.json::<TranslationReply>()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Map a non-2xx body to `LlmError::Api`, decoding the error envelope when possible.
fn api_error(status: u16, body: &str) -> LlmError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => LlmError::Api {
            provider: PROVIDER.to_string(),
            status,
            error_type: parsed.error.kind,
            message: parsed.error.message,
        },
        Err(_) => LlmError::Api {
            provider: PROVIDER.to_string(),
            status,
            error_type: "unknown".to_string(),
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AnthropicClient {
        let mut config = AnthropicConfig::new(SecretString::from("sk-test"));
        config.base_url = base_url.to_string();
        AnthropicClient::new(config).unwrap()
    }

    #[test]
    fn messages_url_strips_trailing_slash() {
        assert_eq!(
            client("https://api.anthropic.com/").messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn api_error_decodes_envelope() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        match api_error(429, body) {
            LlmError::Api {
                status,
                error_type,
                message,
                ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(error_type, "rate_limit_error");
                assert_eq!(message, "slow down");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_keeps_raw_body_when_not_json() {
        match api_error(502, "Bad Gateway") {
            LlmError::Api {
                error_type,
                message,
                ..
            } => {
                assert_eq!(error_type, "unknown");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let config = AnthropicConfig::new(SecretString::from("k"));
        assert_eq!(config.api_version, "2023-06-01");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(client("http://localhost:1").name(), "anthropic");
    }
}
