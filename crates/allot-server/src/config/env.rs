// crates/allot-server/src/config/env.rs
// Environment-based configuration overrides

use crate::llm::Provider;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::file::AllotConfig;

/// API keys loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// GEMINI_API_KEY
    pub gemini: Option<String>,
    /// OPENAI_API_KEY
    pub openai: Option<String>,
    /// ANTHROPIC_API_KEY
    pub anthropic: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let read = |provider: Provider| read_key(lookup, provider.api_key_env_var());
        Self {
            gemini: read(Provider::Gemini),
            openai: read(Provider::OpenAi),
            anthropic: read(Provider::Anthropic),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
        }
    }

    /// Get a summary of available providers
    pub fn summary(&self) -> String {
        let providers: Vec<_> = Provider::ALL
            .iter()
            .filter(|p| self.get(**p).is_some())
            .map(|p| p.display_name())
            .collect();
        if providers.is_empty() {
            "None".to_string()
        } else {
            providers.join(", ")
        }
    }
}

/// Read a single value, filtering empty strings
fn read_key(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|k| !k.trim().is_empty())
}

/// Configuration validation result
#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ConfigValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Apply process environment overrides on top of file config
pub fn apply_env(config: &mut AllotConfig) {
    apply_env_with(config, &|name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup (tests pass a map)
pub fn apply_env_with(config: &mut AllotConfig, lookup: &dyn Fn(&str) -> Option<String>) {
    if let Some(name) = read_key(lookup, "LLM_DEFAULT_PROVIDER") {
        config.llm.default_provider = name.trim().to_lowercase();
    }

    let keys = ApiKeys::from_lookup(lookup);
    for provider in Provider::ALL {
        let prefix = provider.env_prefix();
        let section = config.llm.provider_mut(provider);

        if let Some(key) = keys.get(provider) {
            section.api_key = Some(key.to_string());
        }
        if let Some(url) = read_key(lookup, &format!("{prefix}_BASE_URL")) {
            section.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = read_key(lookup, &format!("{prefix}_MODEL")) {
            section.model = model;
        }
        if let Some(t) = parse_env(lookup, &format!("{prefix}_TEMPERATURE")) {
            section.temperature = t;
        }
        if let Some(n) = parse_env(lookup, &format!("{prefix}_MAX_TOKENS")) {
            section.max_tokens = n;
        }
        if provider == Provider::Gemini
            && let Some(version) = read_key(lookup, "GEMINI_API_VERSION")
        {
            section.api_version = Some(version);
        }
    }

    if let Some(n) = parse_env(lookup, "LLM_ALLOCATION_MAX_RETRIES") {
        config.allocation.max_retries = n;
    }
    if let Some(n) = parse_env(lookup, "LLM_ALLOCATION_TIMEOUT") {
        config.allocation.timeout = n;
    }
    if let Some(n) = parse_env(lookup, "LLM_ALLOCATION_BATCH_SIZE") {
        config.allocation.batch_size = n;
    }
    if let Some(b) = parse_bool(lookup, "LLM_FALLBACK_TO_RULE_BASED") {
        config.allocation.fallback_to_rule_based = b;
    }
    if let Some(b) = parse_bool(lookup, "LLM_LOG_PROMPTS") {
        config.logging.log_prompts = b;
    }
    if let Some(b) = parse_bool(lookup, "LLM_LOG_RESPONSES") {
        config.logging.log_responses = b;
    }
    if let Some(path) = read_key(lookup, "ALLOT_DATABASE") {
        config.database.path = Some(PathBuf::from(path));
    }

    debug!(keys = %keys.summary(), provider = %config.llm.default_provider, "Environment overrides applied");
}

fn parse_env<T: std::str::FromStr>(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = read_key(lookup, name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

fn parse_bool(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let value = read_key(lookup, name)?.to_lowercase();
    match value.trim() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
