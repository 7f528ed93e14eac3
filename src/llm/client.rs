//! LLM client abstraction and provider selection
//!
//! Two providers are supported, both over plain HTTP:
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint
//! - **Ollama**: a local Ollama server (`/api/chat`)

use crate::types::Result;
use crate::utils::toml_config::{LlmConfig, LlmProviderKind};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling parameters shared by every provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4-turbo-preview".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    /// };
    /// ```
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolve the configured provider.
    ///
    /// Returns `None` when no provider is configured or the OpenAI key is
    /// missing from the environment; research then runs without reasoning.
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        match config.provider {
            LlmProviderKind::None => None,
            LlmProviderKind::OpenAI => {
                let api_key = config.api_key()?;
                Some(Provider::OpenAI {
                    api_key,
                    api_base: config
                        .base_url
                        .clone()
                        .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                    model: config.model.clone(),
                })
            }
            LlmProviderKind::Ollama => Some(Provider::Ollama {
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
                model: config.model.clone(),
            }),
        }
    }

    /// Create a client instance for this provider
    pub fn create_client(&self, http: reqwest::Client, options: GenerationOptions) -> Box<dyn LLMClient> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Box::new(super::openai::OpenAIClient::new(
                http,
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                options,
            )),

            Provider::Ollama { base_url, model } => Box::new(super::ollama::OllamaClient::new(
                http,
                base_url.clone(),
                model.clone(),
                options,
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}
