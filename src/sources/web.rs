//! Scraped wiki sources
//!
//! One [`WebSource`] per site. `search` returns the raw page for a subject;
//! turning it into facts is left to [`extract`](super::extract).

use super::extract;
use super::http::{self, FetchError};
use super::{EvidenceSource, FetchResult, SourcePriority};
use crate::types::{EvidenceBundle, FailureKind, Facet, ResearchIntent, SourceFailure};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Known Pokemon wikis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebSite {
    Bulbapedia,
    Serebii,
    PokemonDb,
}

impl WebSite {
    pub const ALL: [WebSite; 3] = [WebSite::Bulbapedia, WebSite::Serebii, WebSite::PokemonDb];

    /// Registry id used when the site is configured implicitly
    pub fn default_id(&self) -> &'static str {
        match self {
            WebSite::Bulbapedia => "bulbapedia",
            WebSite::Serebii => "serebii",
            WebSite::PokemonDb => "pokemondb",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            WebSite::Bulbapedia => "https://bulbapedia.bulbagarden.net",
            WebSite::Serebii => "https://www.serebii.net",
            WebSite::PokemonDb => "https://pokemondb.net",
        }
    }

    pub fn default_trust(&self) -> f64 {
        match self {
            WebSite::Bulbapedia => 0.8,
            WebSite::Serebii => 0.75,
            WebSite::PokemonDb => 0.7,
        }
    }

    pub fn supports(&self, facet: Facet) -> bool {
        match self {
            WebSite::Bulbapedia => facet != Facet::CompetitiveUse,
            WebSite::Serebii => facet != Facet::Lore,
            WebSite::PokemonDb => true,
        }
    }

    /// Page path for a subject, or `None` when the site has no such page
    pub fn page_path(&self, subject: &str, type_search: Option<&str>) -> Option<String> {
        match (self, type_search) {
            (WebSite::Bulbapedia, Some(type_name)) => {
                Some(format!("/wiki/{}_(type)", title_case(type_name)))
            }
            (WebSite::Bulbapedia, None) => Some(format!("/wiki/{}", title_case(subject))),
            (WebSite::Serebii, Some(_)) => None,
            (WebSite::Serebii, None) => Some(format!("/pokedex/{}.shtml", slug(subject))),
            (WebSite::PokemonDb, Some(type_name)) => Some(format!("/type/{}", slug(type_name))),
            (WebSite::PokemonDb, None) => Some(format!("/pokedex/{}", slug(subject))),
        }
    }
}

fn slug(name: &str) -> String {
    super::pokeapi::api_name(name)
}

/// "mr-mime" -> "Mr_Mime"
fn title_case(name: &str) -> String {
    slug(name)
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

pub struct WebSource {
    id: String,
    site: WebSite,
    http: Client,
    base_url: String,
    trust: f64,
}

impl WebSource {
    pub fn new(
        id: impl Into<String>,
        site: WebSite,
        http: Client,
        base_url: impl Into<String>,
        trust: f64,
    ) -> Self {
        Self {
            id: id.into(),
            site,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            trust,
        }
    }

    pub fn site(&self) -> WebSite {
        self.site
    }

    /// Fetch the raw page describing `intent`'s subject
    pub async fn search(&self, intent: &ResearchIntent, timeout: Duration) -> Result<String, FetchError> {
        let path = self
            .site
            .page_path(intent.subject(), intent.type_search())
            .ok_or_else(|| {
                FetchError::new(
                    FailureKind::NotFound,
                    format!("{} has no page for {}", self.id, intent.subject()),
                )
            })?;
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(source = %self.id, url = %url, "Fetching page");
        http::get_text(&self.http, &url, timeout).await
    }
}

#[async_trait]
impl EvidenceSource for WebSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn trust(&self) -> f64 {
        self.trust
    }

    fn priority(&self) -> SourcePriority {
        SourcePriority::Scraped
    }

    fn supports(&self, facet: Facet) -> bool {
        self.site.supports(facet)
    }

    async fn fetch(&self, intent: &ResearchIntent, facet: Facet, timeout: Duration) -> FetchResult {
        let html = match tokio::time::timeout(timeout, self.search(intent, timeout)).await {
            Ok(Ok(html)) => html,
            Ok(Err(err)) => return Err(err.into_failure(&self.id)),
            Err(_) => {
                return Err(SourceFailure::timeout(
                    &self.id,
                    format!("no response within {}ms", timeout.as_millis()),
                ))
            }
        };

        let payload =
            extract::extract(&html, facet, intent.type_search()).map_err(|e| e.into_failure(&self.id))?;

        if payload.is_empty() {
            return Err(SourceFailure::new(
                &self.id,
                FailureKind::ParseError,
                format!("no {} fields found on page for {}", facet, intent.subject()),
            ));
        }

        Ok(EvidenceBundle {
            source_id: self.id.clone(),
            subject: intent.subject().to_string(),
            facet,
            payload,
            fetched_at: Utc::now(),
            trust: self.trust,
        })
    }
}
