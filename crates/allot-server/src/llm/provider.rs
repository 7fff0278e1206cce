// crates/allot-server/src/llm/provider.rs
// LLM provider abstraction layer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::recommendations::RecommendationSet;
use crate::allocation::input::AllocationInput;

/// LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Every supported provider, in listing order
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Anthropic];

    /// Parse provider from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Get the environment variable prefix for this provider's settings
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI",
            Self::OpenAi => "OPENAI",
            Self::Anthropic => "ANTHROPIC",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Human-readable name shown in provider listings
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::OpenAi => "OpenAI GPT",
            Self::Anthropic => "Anthropic Claude",
        }
    }

    /// Default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenAi => "gpt-4",
            Self::Anthropic => "claude-3-sonnet-20240229",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Self::Gemini => 8192,
            Self::OpenAi | Self::Anthropic => 4000,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Trait for allocation providers - every vendor adapter implements this
///
/// Adapters never fail: transport, envelope and parse problems are
/// folded into the returned set's `errors`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Ask the model for allocation recommendations
    async fn generate_recommendations(&self, input: &AllocationInput) -> RecommendationSet;

    /// Get the provider type
    fn provider_type(&self) -> Provider;

    /// Get the model name used for requests
    fn model_name(&self) -> String;
}
