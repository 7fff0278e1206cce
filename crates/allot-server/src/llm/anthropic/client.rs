// crates/allot-server/src/llm/anthropic/client.rs
// Anthropic Messages API adapter (x-api-key header, pinned API version)

use crate::allocation::input::AllocationInput;
use crate::config::{LoggingConfig, ProviderConfig};
use crate::llm::adapter::run_allocation_request;
use crate::llm::anthropic::types::{Message, MessagesRequest, MessagesResponse};
use crate::llm::http_client::LlmHttpClient;
use crate::llm::logging::log_usage;
use crate::llm::prompt::SYSTEM_INSTRUCTION;
use crate::llm::provider::{LlmProvider, Provider};
use crate::llm::recommendations::RecommendationSet;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{Span, instrument};
use uuid::Uuid;

const VENDOR: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude adapter
pub struct AnthropicClient {
    config: ProviderConfig,
    http: LlmHttpClient,
    logging: LoggingConfig,
}

impl AnthropicClient {
    pub fn new(config: ProviderConfig, client: reqwest::Client, logging: LoggingConfig) -> Self {
        Self {
            config,
            http: LlmHttpClient::from_client(client),
            logging,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// No temperature: the Messages call runs at the vendor default
    pub fn build_request(&self, prompt: String) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            system: SYSTEM_INSTRUCTION,
        }
    }

    async fn send(&self, request_id: &str, prompt: String) -> Result<String> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| anyhow!("Anthropic API key is not configured"))?;
        let body = serde_json::to_string(&self.build_request(prompt))?;
        let url = self.endpoint();

        let response_body = self
            .http
            .execute_request(request_id, VENDOR, body, |client, body| {
                client
                    .post(&url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", API_VERSION)
                    .header("Content-Type", "application/json")
                    .body(body)
            })
            .await?;

        let data: MessagesResponse = serde_json::from_str(&response_body)
            .map_err(|_| anyhow!("Invalid response structure from Anthropic"))?;
        if let Some(usage) = &data.usage {
            log_usage(request_id, VENDOR, usage.input_tokens, usage.output_tokens);
        }
        extract_text(&data)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid response structure from Anthropic"))
    }
}

/// `content[0].text`
pub fn extract_text(response: &MessagesResponse) -> Option<&str> {
    response.content.first()?.text.as_deref()
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn provider_type(&self) -> Provider {
        Provider::Anthropic
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }

    #[instrument(skip(self, input), fields(request_id, model = %self.config.model))]
    async fn generate_recommendations(&self, input: &AllocationInput) -> RecommendationSet {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", &request_id);

        run_allocation_request(VENDOR, &request_id, &self.logging, input, |prompt| {
            self.send(&request_id, prompt)
        })
        .await
    }
}
