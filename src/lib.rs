//! # Pokedex Research
//!
//! A multi-source research agent for Pokemon questions. A free-form question
//! is clarified into research intents, answered concurrently by several
//! evidence sources (PokeAPI plus scraped wikis), merged with conflict
//! resolution, scored for confidence and written up as a report.
//!
//! ## Overview
//!
//! Pokedex Research can be used in two ways:
//!
//! 1. **As a CLI** - Run the `pokedex` binary
//! 2. **As a library** - Drive [`ResearchPipeline`] from your own code
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use pokedex::{ResearchConfig, ResearchPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load_or_default(None)?;
//!     let pipeline = ResearchPipeline::from_config(&config)?;
//!
//!     let report = pipeline.conduct_research("What type is Scizor?").await?;
//!     println!("{} (confidence {:.0}%)", report.summary, report.confidence.overall * 100.0);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Sources
//!
//! ```rust,ignore
//! use pokedex::{ResearchPipeline, SourceRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = SourceRegistry::new();
//! registry.register(Arc::new(MyWikiSource::new()));
//!
//! let pipeline = ResearchPipeline::new(&config, registry);
//! ```
//!
//! ## Modules
//!
//! - [`research`] - The pipeline stages
//! - [`sources`] - Evidence sources and their registry
//! - [`llm`] - Optional reasoning and comparison models
//! - [`types`] - Data model and error handling
//! - [`utils`] - `pokedex.toml` configuration
//! - [`cli`] - Command line interface

#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface and terminal output.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Research pipeline stages.
pub mod research;
/// Evidence sources (structured API and scraped wikis).
pub mod sources;
/// Core types (plans, evidence, reports, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, Provider, ReasoningCollaborator};
pub use research::{ResearchPipeline, ResearchRun};
pub use sources::{EvidenceSource, SourceRegistry};
pub use types::{ResearchError, ResearchReport, Result};
pub use utils::toml_config::ResearchConfig;
