// crates/allot-server/src/llm/openai/client.rs
// OpenAI chat completions adapter (Bearer auth, JSON response mode)

use crate::allocation::input::AllocationInput;
use crate::config::{LoggingConfig, ProviderConfig};
use crate::llm::adapter::run_allocation_request;
use crate::llm::http_client::LlmHttpClient;
use crate::llm::logging::log_usage;
use crate::llm::openai::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::llm::prompt::SYSTEM_INSTRUCTION;
use crate::llm::provider::{LlmProvider, Provider};
use crate::llm::recommendations::RecommendationSet;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{Span, instrument};
use uuid::Uuid;

const VENDOR: &str = "OpenAI";

/// OpenAI chat completions adapter
pub struct OpenAiClient {
    config: ProviderConfig,
    http: LlmHttpClient,
    logging: LoggingConfig,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig, client: reqwest::Client, logging: LoggingConfig) -> Self {
        Self {
            config,
            http: LlmHttpClient::from_client(client),
            logging,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    pub fn build_request(&self, prompt: String) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }

    async fn send(&self, request_id: &str, prompt: String) -> Result<String> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| anyhow!("OpenAI API key is not configured"))?;
        let body = serde_json::to_string(&self.build_request(prompt))?;
        let url = self.endpoint();

        let response_body = self
            .http
            .execute_request(request_id, VENDOR, body, |client, body| {
                client
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("Content-Type", "application/json")
                    .body(body)
            })
            .await?;

        let data: ChatResponse = serde_json::from_str(&response_body)
            .map_err(|_| anyhow!("Invalid response structure from OpenAI"))?;
        if let Some(usage) = &data.usage {
            log_usage(request_id, VENDOR, usage.prompt_tokens, usage.completion_tokens);
        }
        extract_text(&data)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid response structure from OpenAI"))
    }
}

/// `choices[0].message.content`
pub fn extract_text(response: &ChatResponse) -> Option<&str> {
    response.choices.first()?.message.as_ref()?.content.as_deref()
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn provider_type(&self) -> Provider {
        Provider::OpenAi
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
