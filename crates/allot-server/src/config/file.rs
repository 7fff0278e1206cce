// crates/allot-server/src/config/file.rs
// File-based configuration from ~/.allot/config.toml

use crate::llm::Provider;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::env::ConfigValidation;

/// Top-level config structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AllotConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Resolved settings for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Only meaningful for Gemini (URL path segment)
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// Built-in defaults for a provider, without an API key
    pub fn defaults_for(provider: Provider) -> Self {
        Self {
            api_key: None,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            temperature: 0.3,
            max_tokens: provider.default_max_tokens(),
            api_version: match provider {
                Provider::Gemini => Some("v1beta".to_string()),
                _ => None,
            },
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// API key, treating blank values as absent
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Optional per-provider values as they appear in the TOML file
#[derive(Debug, Clone, Deserialize, Default)]
struct ProviderSection {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    api_version: Option<String>,
}

impl ProviderSection {
    fn resolve(self, provider: Provider) -> ProviderConfig {
        let defaults = ProviderConfig::defaults_for(provider);
        ProviderConfig {
            api_key: self.api_key,
            base_url: self.base_url.unwrap_or(defaults.base_url),
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            api_version: self.api_version.or(defaults.api_version),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct LlmSection {
    default_provider: Option<String>,
    #[serde(default)]
    gemini: ProviderSection,
    #[serde(default)]
    openai: ProviderSection,
    #[serde(default)]
    anthropic: ProviderSection,
}

/// LLM configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "LlmSection")]
pub struct LlmConfig {
    /// Provider name used when a run does not pin one
    pub default_provider: String,
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
}

impl From<LlmSection> for LlmConfig {
    fn from(section: LlmSection) -> Self {
        Self {
            default_provider: section
                .default_provider
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| Provider::Gemini.to_string()),
            gemini: section.gemini.resolve(Provider::Gemini),
            openai: section.openai.resolve(Provider::OpenAi),
            anthropic: section.anthropic.resolve(Provider::Anthropic),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmSection::default().into()
    }
}

impl LlmConfig {
    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }

    pub fn provider_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::OpenAi => &mut self.openai,
            Provider::Anthropic => &mut self.anthropic,
        }
    }
}

/// Allocation run knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Extra provider attempts after a failed one
    pub max_retries: u32,
    /// Deadline per provider call, in seconds
    pub timeout: u64,
    /// Candidate projects per provider call
    pub batch_size: usize,
    pub fallback_to_rule_based: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: 60,
            batch_size: 50,
            fallback_to_rule_based: false,
        }
    }
}

impl AllocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_prompts: bool,
    pub log_responses: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

impl AllotConfig {
    /// Load config from `ALLOT_CONFIG` or ~/.allot/config.toml, then apply env overrides
    pub fn load() -> Self {
        let path = std::env::var("ALLOT_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        let mut config = Self::load_from(&path);
        super::env::apply_env(&mut config);
        config
    }

    /// Load config from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Directory holding config and the default database
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".allot")
    }

    fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Database path from config, or ~/.allot/allot.db
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::home_dir().join("allot.db"))
    }

    /// Get the default LLM provider, if the configured name is known
    pub fn default_provider(&self) -> Option<Provider> {
        Provider::from_str(&self.llm.default_provider)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        match self.default_provider() {
            Some(provider) => {
                if self.llm.provider(provider).api_key().is_none() {
                    validation.add_warning(format!(
                        "No API key for default provider '{}'. Set {}.",
                        provider,
                        provider.api_key_env_var()
                    ));
                }
            }
            None => validation.add_error(format!(
                "Unknown default provider '{}'. Valid options: gemini, openai, anthropic",
                self.llm.default_provider
            )),
        }

        if self.allocation.batch_size == 0 {
            validation.add_error("allocation.batch_size must be at least 1");
        }
        if self.allocation.timeout == 0 {
            validation.add_error("allocation.timeout must be at least 1 second");
        }

        validation
    }
}
