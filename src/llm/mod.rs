//! LLM Provider Clients and Abstractions
//!
//! The research pipeline does not need a language model: every fact in a
//! report comes from an evidence source. A model, when configured, is used
//! for two advisory jobs:
//! - [`LlmReasoner`] - elaborates on the aggregated findings
//! - [`ComparisonClient`] - answers the raw question for a side-by-side view
//!
//! Both sit on the [`LLMClient`] trait, implemented for OpenAI-compatible
//! APIs and for a local Ollama server.
//!
//! # Example
//!
//! ```ignore
//! use pokedex::llm::{GenerationOptions, Provider};
//!
//! let provider = Provider::from_config(&config.llm).expect("no provider");
//! let client = provider.create_client(reqwest::Client::new(), GenerationOptions::default());
//!
//! let answer = client.generate("What type is Scizor?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Plain chat answers for comparison output.
pub mod comparison;
pub mod ollama;
pub mod openai;
/// Advisory reasoning collaborator.
pub mod reasoning;

pub use client::{GenerationOptions, LLMClient, Provider};
pub use comparison::ComparisonClient;
pub use reasoning::{LlmReasoner, ReasoningCollaborator};
