//! Multi-source research pipeline
//!
//! A question goes through five stages, each its own module:
//!
//! 1. **Goal clarification** ([`clarifier`]) - question to research intents
//! 2. **Evidence collection** ([`coordinator`]) - concurrent fetches from every
//!    registered source within a time budget
//! 3. **Aggregation** ([`aggregator`]) - conflict-resolved facts per subject
//! 4. **Confidence** ([`confidence`]) - agreement and coverage scoring
//! 5. **Synthesis** ([`synthesis`]) - the final report
//!
//! # Usage
//!
//! ```ignore
//! use pokedex::research::ResearchPipeline;
//! use pokedex::utils::toml_config::ResearchConfig;
//!
//! let config = ResearchConfig::load_or_default(None)?;
//! let pipeline = ResearchPipeline::from_config(&config)?;
//!
//! let report = pipeline
//!     .conduct_research("Build a team of all bug type Pokemon.")
//!     .await?;
//!
//! println!("{}", report.summary);
//! for source in &report.citations {
//!     println!("- {}", source);
//! }
//! ```
//!
//! Each query builds its own object graph; nothing is shared between
//! concurrent queries.

/// Bundle merging and conflict resolution.
pub mod aggregator;
/// Query to intent translation.
pub mod clarifier;
/// Confidence scoring.
pub mod confidence;
/// Concurrent evidence collection.
pub mod coordinator;
/// Report synthesis.
pub mod synthesis;
/// Static type chart, roster and keyword tables.
pub mod taxonomy;

pub use aggregator::ContextAggregator;
pub use clarifier::GoalClarifier;
pub use confidence::ConfidenceScorer;
pub use coordinator::{SourceCoordinator, SourceOutcome};
pub use synthesis::SynthesisEngine;

use crate::llm::{GenerationOptions, LlmReasoner, Provider, ReasoningCollaborator};
use crate::sources::{self, SourceRegistry};
use crate::types::{ResearchError, ResearchPlan, ResearchReport, Result};
use crate::utils::toml_config::ResearchConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// A finished run: the report plus per-fetch diagnostics
#[derive(Debug, Clone)]
pub struct ResearchRun {
    pub report: ResearchReport,
    pub outcomes: Vec<SourceOutcome>,
}

pub struct ResearchPipeline {
    clarifier: GoalClarifier,
    coordinator: SourceCoordinator,
    sources: SourceRegistry,
    aggregator: ContextAggregator,
    scorer: ConfidenceScorer,
    synthesis: SynthesisEngine,
    budget: Duration,
}

impl ResearchPipeline {
    /// Assemble a pipeline around an explicit source registry
    pub fn new(config: &ResearchConfig, sources: SourceRegistry) -> Self {
        Self {
            clarifier: GoalClarifier::new(config.pipeline.max_subjects),
            coordinator: SourceCoordinator::new(config.pipeline.clone()),
            sources,
            aggregator: ContextAggregator::new(),
            scorer: ConfidenceScorer::new(config.scoring.clone()),
            synthesis: SynthesisEngine::new(config.pipeline.team_size),
            budget: config.pipeline.budget(),
        }
    }

    /// Build sources and the optional reasoner from configuration
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let http = sources::http::build_client()
            .map_err(|e| ResearchError::Http(format!("Failed to build HTTP client: {}", e)))?;
        let registry = SourceRegistry::from_config(config, http.clone());
        let mut pipeline = Self::new(config, registry);

        if config.pipeline.reasoning_enabled {
            match Provider::from_config(&config.llm) {
                Some(provider) => {
                    tracing::info!("Reasoning enabled with {} ({})", provider.name(), provider.model());
                    let options = GenerationOptions {
                        temperature: config.llm.temperature,
                        max_tokens: config.llm.max_tokens,
                    };
                    let client = provider.create_client(http, options);
                    pipeline = pipeline.with_reasoner(Arc::new(LlmReasoner::new(client, config.llm.timeout())));
                }
                None => tracing::warn!("No LLM available; reports will not include reasoning"),
            }
        }

        Ok(pipeline)
    }

    pub fn with_reasoner(mut self, reasoner: Arc<dyn ReasoningCollaborator>) -> Self {
        self.synthesis = self.synthesis.with_reasoner(reasoner);
        self
    }

    /// Override the evidence budget
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Clarify a query without researching it
    pub fn plan(&self, query: &str) -> Result<ResearchPlan> {
        self.clarifier.plan(query)
    }

    /// Research a question end to end
    pub async fn conduct_research(&self, query: &str) -> Result<ResearchReport> {
        self.conduct_research_detailed(query).await.map(|run| run.report)
    }

    /// Research a question, keeping every source outcome for diagnostics
    #[instrument(skip(self))]
    pub async fn conduct_research_detailed(&self, query: &str) -> Result<ResearchRun> {
        let plan = self.clarifier.plan(query)?;
        tracing::info!(
            "Planned {} intents ({:?}) for: {}",
            plan.intents.len(),
            plan.query_class,
            plan.query
        );

        let outcomes = self
            .coordinator
            .collect(&plan.intents, &self.sources, self.budget)
            .await?;

        let bundles = coordinator::bundles(&outcomes);
        let contexts = self.aggregator.aggregate_all(&plan.intents, &bundles);
        let confidence = self.scorer.score_all(&contexts, &plan.intents);
        tracing::info!("Overall confidence {:.2}", confidence.overall);

        let report = self.synthesis.synthesize(&plan, contexts, confidence).await;

        Ok(ResearchRun { report, outcomes })
    }
}
