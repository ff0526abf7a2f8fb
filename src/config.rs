//! Configuration management for liftbox
//!
//! Settings are loaded from environment variables with defaults. Provider
//! credentials are not handled here: genai reads its own variables
//! (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`, `OLLAMA_HOST`, ...), and the
//! OpenAI-compatible client reads `LIFTBOX_API_KEY`.
//!
//! # Environment Variables
//!
//! - `LIFTBOX_PROVIDER`: genai adapter name (`anthropic`, `openai`, `ollama`,
//!   `gemini`, ...) or `openai-compatible` - default: "anthropic"
//! - `LIFTBOX_MODEL`: model name - default depends on the provider
//! - `LIFTBOX_API_BASE_URL`: custom endpoint (required for `openai-compatible`)
//! - `LIFTBOX_API_KEY`: bearer token for `openai-compatible`
//! - `LIFTBOX_REQUEST_TIMEOUT`: seconds - default: "300"
//! - `LIFTBOX_MAX_TOKENS`: baseline generation budget - default: "8192"
//! - `LIFTBOX_TEMPERATURE`: default: "0.1"
//! - `LIFTBOX_INPUT_PRICE` / `LIFTBOX_OUTPUT_PRICE`: USD per million tokens -
//!   default: "3.0" / "15.0"
//! - `LIFTBOX_LOG_LEVEL`: default: "info"
//!
//! # Example
//!
//! ```no_run
//! use liftbox::LiftboxConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LiftboxConfig::default();
//! config.validate()?;
//! let client = config.create_client()?;
//! # Ok(())
//! # }
//! ```

use crate::checkpoint::Pricing;
use crate::convert::GenerationBudget;
use crate::llm::{BackendError, GenAIClient, LLMClient, OpenAICompatibleClient};
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:14b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f32 = 0.1;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;
const MAX_TOKENS_LIMIT: u32 = 200_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: anthropic, openai, ollama, gemini, groq, xai, deepseek, openai-compatible")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Client initialization failed: {0}")]
    ClientInitError(#[from] BackendError),
}

/// Where provider calls go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Any adapter genai supports
    GenAI(AdapterKind),
    /// A server speaking the OpenAI chat completions protocol
    OpenAICompatible,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "openai-compatible" | "openai_compatible" | "compatible" => {
                Ok(ProviderKind::OpenAICompatible)
            }
            "claude" => Ok(ProviderKind::GenAI(AdapterKind::Anthropic)),
            other => AdapterKind::from_lower_str(other)
                .map(ProviderKind::GenAI)
                .ok_or_else(|| ConfigError::InvalidProvider(name.to_string())),
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::GenAI(AdapterKind::Anthropic) => DEFAULT_ANTHROPIC_MODEL,
            ProviderKind::GenAI(AdapterKind::Ollama) => DEFAULT_OLLAMA_MODEL,
            _ => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::GenAI(kind) => write!(f, "{}", kind.as_str().to_lowercase()),
            ProviderKind::OpenAICompatible => f.write_str("openai-compatible"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiftboxConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Baseline generation budget; doubled once when a response is truncated
    pub max_tokens: u32,
    pub temperature: f32,
    pub pricing: Pricing,
    pub log_level: String,
}

impl Default for LiftboxConfig {
    /// Loads from `LIFTBOX_*` environment variables, falling back to defaults
    fn default() -> Self {
        let provider = env::var("LIFTBOX_PROVIDER")
            .ok()
            .and_then(|s| ProviderKind::parse(&s).ok())
            .unwrap_or(ProviderKind::GenAI(AdapterKind::Anthropic));

        let model = env::var("LIFTBOX_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let request_timeout_secs = env_parse("LIFTBOX_REQUEST_TIMEOUT")
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let max_tokens = env_parse("LIFTBOX_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = env_parse("LIFTBOX_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE);

        let defaults = Pricing::default();
        let pricing = Pricing {
            input_per_million: env_parse("LIFTBOX_INPUT_PRICE")
                .unwrap_or(defaults.input_per_million),
            output_per_million: env_parse("LIFTBOX_OUTPUT_PRICE")
                .unwrap_or(defaults.output_per_million),
        };

        let log_level = env::var("LIFTBOX_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            api_base_url: env::var("LIFTBOX_API_BASE_URL").ok(),
            api_key: env::var("LIFTBOX_API_KEY").ok(),
            request_timeout_secs,
            max_tokens,
            temperature,
            pricing,
            log_level,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl LiftboxConfig {
    /// Overrides the provider and resets the model to that provider's default
    /// unless `model` is given.
    pub fn with_provider(mut self, provider: ProviderKind, model: Option<String>) -> Self {
        self.model = model.unwrap_or_else(|| provider.default_model().to_string());
        self.provider = provider;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 1 hour".to_string(),
            ));
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "Max tokens must be between 1 and {}",
                MAX_TOKENS_LIMIT
            )));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "Temperature {} is outside 0.0..=1.0",
                self.temperature
            )));
        }

        let prices = [
            self.pricing.input_per_million,
            self.pricing.output_per_million,
        ];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "Token prices must be non-negative".to_string(),
            ));
        }

        if self.provider == ProviderKind::OpenAICompatible && self.api_base_url.is_none() {
            return Err(ConfigError::ValidationFailed(
                "LIFTBOX_API_BASE_URL is required for the openai-compatible provider".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn budget(&self) -> GenerationBudget {
        GenerationBudget::new(self.max_tokens, self.temperature)
    }

    /// Builds the configured provider client
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>, ConfigError> {
        let timeout = self.request_timeout();
        match self.provider {
            ProviderKind::GenAI(kind) => Ok(Arc::new(GenAIClient::new(
                kind,
                self.model.clone(),
                self.api_base_url.clone(),
                timeout,
            ))),
            ProviderKind::OpenAICompatible => {
                let endpoint = self.api_base_url.clone().ok_or_else(|| {
                    ConfigError::ValidationFailed(
                        "LIFTBOX_API_BASE_URL is required for the openai-compatible provider"
                            .to_string(),
                    )
                })?;
                let mut client = OpenAICompatibleClient::new(endpoint, self.model.clone(), timeout)?;
                if let Some(key) = &self.api_key {
                    client = client.with_api_key(key.clone());
                }
                Ok(Arc::new(client))
            }
        }
    }
}

impl fmt::Display for LiftboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Liftbox Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        if let Some(url) = &self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Max Tokens: {}", self.max_tokens)?;
        writeln!(f, "  Temperature: {}", self.temperature)?;
        writeln!(
            f,
            "  Pricing: ${}/M input, ${}/M output",
            self.pricing.input_per_million, self.pricing.output_per_million
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
