//! Evidence sources
//!
//! Every concrete source (the structured PokeAPI and each scraped wiki) sits
//! behind the [`EvidenceSource`] trait and is registered into a
//! [`SourceRegistry`]. The coordinator only ever sees the trait, so adding a
//! new site means implementing `fetch` and registering it.
//!
//! Adapters never panic and never return uncontrolled errors: transport and
//! parsing problems are classified into a [`SourceFailure`](crate::types::SourceFailure).

pub mod extract;
pub mod http;
pub mod pokeapi;
pub mod web;

use crate::types::{EvidenceBundle, Facet, ResearchIntent, SourceFailure};
use crate::utils::toml_config::{ResearchConfig, SourceConfig};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use pokeapi::{PokeApiClient, PokeApiSource};
pub use web::{WebSite, WebSource};

/// Outcome of one adapter call
pub type FetchResult = std::result::Result<EvidenceBundle, SourceFailure>;

/// Scheduling class of a source; structured APIs get a tighter timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePriority {
    Structured,
    Scraped,
}

#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn id(&self) -> &str;

    /// Static weight in [0, 1]
    fn trust(&self) -> f64;

    fn priority(&self) -> SourcePriority;

    /// Whether this source can say anything about `facet`
    fn supports(&self, facet: Facet) -> bool;

    /// Fetch one facet of one intent, giving up after `timeout`
    async fn fetch(&self, intent: &ResearchIntent, facet: Facet, timeout: Duration) -> FetchResult;
}

/// Sources keyed by id. Iteration is in id order.
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn EvidenceSource>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Build the registry from the enabled `[sources.*]` tables
    pub fn from_config(config: &ResearchConfig, http: reqwest::Client) -> Self {
        let mut registry = Self::new();

        for (id, source) in config.enabled_sources() {
            match source {
                SourceConfig::PokeApi {
                    base_url,
                    trust,
                    member_limit,
                    ..
                } => {
                    let client = PokeApiClient::new(http.clone(), base_url.clone());
                    registry.register(Arc::new(
                        PokeApiSource::new(id, client, *trust).with_member_limit(*member_limit),
                    ));
                }
                SourceConfig::Web { site, base_url, .. } => {
                    let base_url = base_url
                        .clone()
                        .unwrap_or_else(|| site.default_base_url().to_string());
                    registry.register(Arc::new(WebSource::new(
                        id,
                        *site,
                        http.clone(),
                        base_url,
                        source.trust(),
                    )));
                }
            }
        }

        registry
    }

    /// Register a source, replacing any previous one with the same id
    pub fn register(&mut self, source: Arc<dyn EvidenceSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn EvidenceSource>> {
        self.sources.get(id).cloned()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EvidenceSource>> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}
