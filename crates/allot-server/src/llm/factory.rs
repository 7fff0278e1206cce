// crates/allot-server/src/llm/factory.rs
// Provider factory: name resolution and adapter construction

use crate::config::{LlmConfig, LoggingConfig, ProviderConfig};
use crate::error::{AllotError, Result};
use crate::llm::anthropic::AnthropicClient;
use crate::llm::gemini::GeminiClient;
use crate::llm::openai::OpenAiClient;
use crate::llm::provider::{LlmProvider, Provider};
use allot_types::ProviderStatus;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds provider adapters from configuration
pub struct ProviderFactory {
    config: LlmConfig,
    client: Client,
    logging: LoggingConfig,
}

impl ProviderFactory {
    /// `client` is shared by every adapter this factory creates
    pub fn new(config: LlmConfig, client: Client, logging: LoggingConfig) -> Self {
        Self {
            config,
            client,
            logging,
        }
    }

    /// Configured default provider name
    pub fn default_provider_name(&self) -> &str {
        &self.config.default_provider
    }

    /// Resolve a provider name, falling back to the configured default
    pub fn resolve(&self, name: Option<&str>) -> Result<Provider> {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.config.default_provider);
        Provider::from_str(name).ok_or_else(|| AllotError::UnknownProvider(name.to_string()))
    }

    /// Create the adapter for `name` (or the default provider).
    ///
    /// A missing API key is not an error here; the adapter reports it per call.
    pub fn create(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>> {
        let provider = self.resolve(name)?;
        let config = self.config.provider(provider).clone();
        info!(provider = %provider, model = %config.model, "Creating LLM provider");
        Ok(self.build(provider, config))
    }

    fn build(&self, provider: Provider, config: ProviderConfig) -> Arc<dyn LlmProvider> {
        let client = self.client.clone();
        let logging = self.logging.clone();
        match provider {
            Provider::Gemini => Arc::new(GeminiClient::new(config, client, logging)),
            Provider::OpenAi => Arc::new(OpenAiClient::new(config, client, logging)),
            Provider::Anthropic => Arc::new(AnthropicClient::new(config, client, logging)),
        }
    }

    /// True iff every required field for `name` is non-empty (only the API key is required)
    pub fn validate_config(name: &str, config: &ProviderConfig) -> Result<bool> {
        let provider =
            Provider::from_str(name).ok_or_else(|| AllotError::UnknownProvider(name.to_string()))?;
        let valid = config.api_key().is_some();
        debug!(provider = %provider, valid, "Validated provider config");
        Ok(valid)
    }

    /// Every supported provider with its display name
    pub fn available_providers() -> Vec<(Provider, &'static str)> {
        Provider::ALL.iter().map(|p| (*p, p.display_name())).collect()
    }

    /// Per-provider configuration status for the admin surface
    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        Self::available_providers()
            .into_iter()
            .map(|(provider, name)| {
                let config = self.config.provider(provider);
                ProviderStatus {
                    provider: provider.to_string(),
                    name: name.to_string(),
                    configured: config.api_key().is_some(),
                    has_base_url: !config.base_url.trim().is_empty(),
                }
            })
            .collect()
    }
}
