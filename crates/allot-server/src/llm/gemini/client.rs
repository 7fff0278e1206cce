// crates/allot-server/src/llm/gemini/client.rs
// Google Gemini generateContent adapter (API key in the query string)

use crate::allocation::input::AllocationInput;
use crate::config::{LoggingConfig, ProviderConfig};
use crate::llm::adapter::run_allocation_request;
use crate::llm::gemini::types::{
    GeminiContent, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig, SafetySetting,
};
use crate::llm::http_client::LlmHttpClient;
use crate::llm::logging::log_usage;
use crate::llm::provider::{LlmProvider, Provider};
use crate::llm::recommendations::RecommendationSet;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{Span, instrument};
use uuid::Uuid;

const VENDOR: &str = "Gemini";
const TOP_K: u32 = 40;
const TOP_P: f64 = 0.95;
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google Gemini adapter
pub struct GeminiClient {
    config: ProviderConfig,
    http: LlmHttpClient,
    logging: LoggingConfig,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig, client: reqwest::Client, logging: LoggingConfig) -> Self {
        Self {
            config,
            http: LlmHttpClient::from_client(client),
            logging,
        }
    }

    /// `{base_url}/{api_version}/models/{model}:generateContent`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version.as_deref().unwrap_or("v1beta"),
            self.config.model
        )
    }

    pub fn build_request(&self, prompt: String) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: self.config.max_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }

    async fn send(&self, request_id: &str, prompt: String) -> Result<String> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| anyhow!("Gemini API key is not configured"))?;
        let body = serde_json::to_string(&self.build_request(prompt))?;
        let url = format!("{}?key={}", self.endpoint(), api_key);

        let response_body = self
            .http
            .execute_request(request_id, VENDOR, body, |client, body| {
                client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .body(body)
            })
            .await?;

        let data: GeminiResponse = serde_json::from_str(&response_body)
            .map_err(|_| anyhow!("Invalid response structure from Gemini"))?;
        if let Some(usage) = &data.usage_metadata {
            log_usage(
                request_id,
                VENDOR,
                usage.prompt_token_count,
                usage.candidates_token_count.unwrap_or(0),
            );
        }
        extract_text(&data)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid response structure from Gemini"))
    }
}

/// `candidates[0].content.parts[0].text`
pub fn extract_text(response: &GeminiResponse) -> Option<&str> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .text
        .as_deref()
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn provider_type(&self) -> Provider {
        Provider::Gemini
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
