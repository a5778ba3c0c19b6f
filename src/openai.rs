//! OpenAI client configuration.

use crate::config::OpenAISettings;
use crate::error::{ItineraError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from settings.
///
/// The key comes from `OPENAI_API_KEY` (or `API_KEY`); the base URL from
/// `OPENAI_BASE_URL` or the config file, so OpenAI-compatible gateways work.
pub fn create_client(settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new();
    if let Some(key) = settings.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = settings.base_url() {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_seconds))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ItineraError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
