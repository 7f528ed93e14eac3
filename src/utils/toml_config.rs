//! TOML-based configuration for the research pipeline
//!
//! This module provides declarative configuration for the pipeline budget,
//! scoring tunables, evidence sources and the optional reasoning model via a
//! TOML file (`pokedex.toml`).
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Secrets are never stored in the file: the `[llm]`
//! table names the environment variable holding the API key, which is
//! resolved lazily (after `.env` has been loaded by the binary).
//!
//! The configuration is passed as an explicit value into the coordinator and
//! pipeline at construction time; nothing reads it from global state.

use crate::sources::web::WebSite;
use crate::sources::SourcePriority;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "pokedex.toml";

/// Root configuration structure loaded from pokedex.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Named evidence sources. Replaces the built-in set when present.
    #[serde(default = "default_sources")]
    pub sources: BTreeMap<String, SourceConfig>,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            pipeline: PipelineConfig::default(),
            scoring: ScoringConfig::default(),
            sources: default_sources(),
            llm: LlmConfig::default(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human readable format
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Overall evidence collection budget per query
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,

    /// Maximum concurrent adapter calls
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Extra attempts for retriable failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Share of the budget granted to one structured API call
    #[serde(default = "default_structured_timeout_fraction")]
    pub structured_timeout_fraction: f64,

    /// Share of the budget granted to one scraped page fetch
    #[serde(default = "default_scraped_timeout_fraction")]
    pub scraped_timeout_fraction: f64,

    #[serde(default = "default_max_subjects")]
    pub max_subjects: usize,

    #[serde(default = "default_team_size")]
    pub team_size: usize,

    /// Run the advisory reasoning step when an LLM is configured
    #[serde(default = "default_true")]
    pub reasoning_enabled: bool,
}

fn default_budget_ms() -> u64 {
    15_000
}

fn default_max_in_flight() -> usize {
    4
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_structured_timeout_fraction() -> f64 {
    0.3
}

fn default_scraped_timeout_fraction() -> f64 {
    0.6
}

fn default_max_subjects() -> usize {
    6
}

fn default_team_size() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            budget_ms: default_budget_ms(),
            max_in_flight: default_max_in_flight(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            structured_timeout_fraction: default_structured_timeout_fraction(),
            scraped_timeout_fraction: default_scraped_timeout_fraction(),
            max_subjects: default_max_subjects(),
            team_size: default_team_size(),
            reasoning_enabled: true,
        }
    }
}

impl PipelineConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Per-call timeout for a source of the given priority
    pub fn call_timeout(&self, priority: SourcePriority) -> Duration {
        let fraction = match priority {
            SourcePriority::Structured => self.structured_timeout_fraction,
            SourcePriority::Scraped => self.scraped_timeout_fraction,
        };
        self.budget().mul_f64(fraction.clamp(0.0, 1.0))
    }

    /// Copy with a different budget, keeping every other knob
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget_ms = budget.as_millis() as u64;
        self
    }
}

// ============= Scoring Configuration =============

/// Tunables for the confidence scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Multiplier applied to facets that only one source contributed to.
    /// Must stay in [0.5, 1.0] so that a conflicting second source never
    /// raises a facet's score.
    #[serde(default = "default_single_source_multiplier")]
    pub single_source_multiplier: f64,

    /// Weight of the share of requested facets that returned nothing
    #[serde(default = "default_coverage_penalty")]
    pub coverage_penalty: f64,
}

fn default_single_source_multiplier() -> f64 {
    0.7
}

fn default_coverage_penalty() -> f64 {
    0.5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            single_source_multiplier: default_single_source_multiplier(),
            coverage_penalty: default_coverage_penalty(),
        }
    }
}

// ============= Source Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    PokeApi {
        #[serde(default = "default_pokeapi_url")]
        base_url: String,
        #[serde(default = "default_pokeapi_trust")]
        trust: f64,
        #[serde(default = "default_true")]
        enabled: bool,
        /// Maximum members listed for a type search
        #[serde(default = "default_member_limit")]
        member_limit: usize,
    },
    Web {
        site: WebSite,
        /// Overrides the site's public URL (mirrors, tests)
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        trust: Option<f64>,
        #[serde(default = "default_true")]
        enabled: bool,
    },
}

fn default_pokeapi_url() -> String {
    "https://pokeapi.co/api/v2".to_string()
}

fn default_pokeapi_trust() -> f64 {
    0.95
}

fn default_member_limit() -> usize {
    10
}

impl SourceConfig {
    pub fn enabled(&self) -> bool {
        match self {
            SourceConfig::PokeApi { enabled, .. } | SourceConfig::Web { enabled, .. } => *enabled,
        }
    }

    pub fn trust(&self) -> f64 {
        match self {
            SourceConfig::PokeApi { trust, .. } => *trust,
            SourceConfig::Web { site, trust, .. } => trust.unwrap_or_else(|| site.default_trust()),
        }
    }
}

fn default_sources() -> BTreeMap<String, SourceConfig> {
    let mut sources = BTreeMap::new();
    sources.insert(
        "pokeapi".to_string(),
        SourceConfig::PokeApi {
            base_url: default_pokeapi_url(),
            trust: default_pokeapi_trust(),
            enabled: true,
            member_limit: default_member_limit(),
        },
    );
    for site in WebSite::ALL {
        sources.insert(
            site.default_id().to_string(),
            SourceConfig::Web {
                site,
                base_url: None,
                trust: None,
                enabled: true,
            },
        );
    }
    sources
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// No reasoning model; reports are structured fact listings
    None,
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: LlmProviderKind,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API base for OpenAI-compatible endpoints, server URL for Ollama
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_provider() -> LlmProviderKind {
    LlmProviderKind::OpenAI
}

fn default_llm_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_llm_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the environment
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    DisabledSource,
    NoScrapedSources,
    MissingApiKey,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::types::ResearchError {
    fn from(err: ConfigError) -> Self {
        crate::types::ResearchError::Config(err.to_string())
    }
}

impl ResearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ResearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load an explicit path, or `pokedex.toml` when it exists, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate value ranges and source availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;

        if pipeline.budget_ms == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.budget_ms must be greater than zero".to_string(),
            ));
        }
        if pipeline.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_in_flight must be at least 1".to_string(),
            ));
        }
        for (name, fraction) in [
            ("structured_timeout_fraction", pipeline.structured_timeout_fraction),
            ("scraped_timeout_fraction", pipeline.scraped_timeout_fraction),
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "pipeline.{} must be in (0, 1], got {}",
                    name, fraction
                )));
            }
        }
        if pipeline.max_subjects == 0 || pipeline.team_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_subjects and pipeline.team_size must be at least 1".to_string(),
            ));
        }

        let scoring = &self.scoring;
        if !(0.5..=1.0).contains(&scoring.single_source_multiplier) {
            return Err(ConfigError::ValidationError(format!(
                "scoring.single_source_multiplier must be in [0.5, 1.0], got {}",
                scoring.single_source_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&scoring.coverage_penalty) {
            return Err(ConfigError::ValidationError(format!(
                "scoring.coverage_penalty must be in [0.0, 1.0], got {}",
                scoring.coverage_penalty
            )));
        }

        for (name, source) in &self.sources {
            let trust = source.trust();
            if !(0.0..=1.0).contains(&trust) {
                return Err(ConfigError::ValidationError(format!(
                    "Source '{}' has trust {} outside [0, 1]",
                    name, trust
                )));
            }
        }

        if !self.sources.values().any(SourceConfig::enabled) {
            return Err(ConfigError::ValidationError(
                "At least one evidence source must be enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate configuration with warnings for degraded setups
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings: Vec<ConfigWarning> = self
            .sources
            .iter()
            .filter(|(_, source)| !source.enabled())
            .map(|(name, _)| ConfigWarning {
                kind: ConfigWarningKind::DisabledSource,
                message: format!("Source '{}' is disabled", name),
            })
            .collect();

        let any_web = self
            .sources
            .values()
            .any(|s| s.enabled() && matches!(s, SourceConfig::Web { .. }));
        if !any_web {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoScrapedSources,
                message: "No web sources enabled; every fact will be single-sourced".to_string(),
            });
        }

        if self.llm.provider == LlmProviderKind::OpenAI && self.llm.api_key().is_none() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::MissingApiKey,
                message: format!(
                    "Environment variable '{}' is not set; reports will skip the reasoning step",
                    self.llm.api_key_env
                ),
            });
        }

        Ok(warnings)
    }

    /// Enabled sources in id order
    pub fn enabled_sources(&self) -> Vec<(&str, &SourceConfig)> {
        self.sources
            .iter()
            .filter(|(_, source)| source.enabled())
            .map(|(name, source)| (name.as_str(), source))
            .collect()
    }
}
