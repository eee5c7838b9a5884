//! Translation provider integration.
//!
//! The pipeline only sees the `TranslationProvider` trait; `AnthropicClient`
//! is the production implementation over the Messages API.

pub mod anthropic;
pub mod provider;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use provider::*;

use std::sync::Arc;

use crate::error::LlmError;

/// Create the production translation provider.
pub fn create_provider(config: AnthropicConfig) -> Result<Arc<dyn TranslationProvider>, LlmError> {
    let client = AnthropicClient::new(config)?;
    tracing::info!("Using Anthropic translation provider");
    Ok(Arc::new(client))
}
