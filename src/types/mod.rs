use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Suffix that marks a subject as a search over every member of a type
pub const TYPE_SEARCH_SUFFIX: &str = "-type-search";

// ============= Research Plan Types =============

/// A category of information that can be researched about a subject.
///
/// The declaration order is the canonical facet order used for map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Stats,
    Typing,
    Evolution,
    Location,
    CompetitiveUse,
    Lore,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Stats,
        Facet::Typing,
        Facet::Evolution,
        Facet::Location,
        Facet::CompetitiveUse,
        Facet::Lore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Stats => "stats",
            Facet::Typing => "typing",
            Facet::Evolution => "evolution",
            Facet::Location => "location",
            Facet::CompetitiveUse => "competitive_use",
            Facet::Lore => "lore",
        }
    }

    /// Human readable section title
    pub fn title(&self) -> &'static str {
        match self {
            Facet::Stats => "Stats",
            Facet::Typing => "Typing",
            Facet::Evolution => "Evolution",
            Facet::Location => "Location",
            Facet::CompetitiveUse => "Competitive Use",
            Facet::Lore => "Lore",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad intent behind a query, used to pick default facets and the
/// shape of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    TeamBuilding,
    Training,
    Discovery,
    Strategy,
    Lore,
    General,
}

impl QueryClass {
    /// Whether the report closes with a recommendation section
    pub fn wants_recommendation(&self) -> bool {
        matches!(self, QueryClass::TeamBuilding | QueryClass::Strategy)
    }
}

/// A structured request for information about one subject.
///
/// Built once by the goal clarifier and never modified afterwards, so the
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchIntent {
    subject: String,
    facets: Vec<Facet>,
}

impl ResearchIntent {
    /// Create an intent. Duplicate facets are dropped, first occurrence wins.
    pub fn new(subject: impl Into<String>, facets: impl IntoIterator<Item = Facet>) -> Self {
        let mut ordered = Vec::new();
        for facet in facets {
            if !ordered.contains(&facet) {
                ordered.push(facet);
            }
        }
        Self {
            subject: subject.into(),
            facets: ordered,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Requested facets in the order the clarifier asked for them
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn requests(&self, facet: Facet) -> bool {
        self.facets.contains(&facet)
    }

    /// The type name when this intent is a search over a whole type
    pub fn type_search(&self) -> Option<&str> {
        parse_type_search(&self.subject)
    }
}

/// Subject string for a search over every member of `type_name`
pub fn type_search_subject(type_name: &str) -> String {
    format!("{}{}", type_name, TYPE_SEARCH_SUFFIX)
}

/// Inverse of [`type_search_subject`]
pub fn parse_type_search(subject: &str) -> Option<&str> {
    subject
        .strip_suffix(TYPE_SEARCH_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// Output of goal clarification: the query, its class and the intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub query: String,
    pub query_class: QueryClass,
    pub intents: Vec<ResearchIntent>,
}

impl ResearchPlan {
    /// Every facet requested by any intent, in first-request order
    pub fn requested_facets(&self) -> Vec<Facet> {
        let mut facets = Vec::new();
        for facet in self.intents.iter().flat_map(|i| i.facets().iter().copied()) {
            if !facets.contains(&facet) {
                facets.push(facet);
            }
        }
        facets
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.intents.iter().map(|i| i.subject()).collect()
    }
}

// ============= Evidence Types =============

/// One source's answer to one facet of one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub source_id: String,
    pub subject: String,
    pub facet: Facet,
    pub payload: BTreeMap<String, Value>,
    pub fetched_at: DateTime<Utc>,
    /// Static per-source weight in [0, 1]
    pub trust: f64,
}

/// Classified reason an adapter call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NotFound,
    RateLimited,
    ParseError,
    Unreachable,
}

impl FailureKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, FailureKind::Timeout | FailureKind::RateLimited)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::NotFound => "not found",
            FailureKind::RateLimited => "rate limited",
            FailureKind::ParseError => "parse error",
            FailureKind::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}

/// Terminal result of a single failed adapter attempt. Carries no partial data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{source_id}: {reason} ({detail})")]
pub struct SourceFailure {
    pub source_id: String,
    pub reason: FailureKind,
    pub retriable: bool,
    pub detail: String,
}

impl SourceFailure {
    pub fn new(source_id: impl Into<String>, reason: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            reason,
            retriable: reason.is_retriable(),
            detail: detail.into(),
        }
    }

    pub fn timeout(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(source_id, FailureKind::Timeout, detail)
    }
}

// ============= Aggregation Types =============

/// A merged, conflict-resolved value for one `(facet, field)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactValue {
    pub value: Value,
    /// Every source that reported a non-null value, agreeing ones first
    pub supporting_sources: Vec<String>,
    /// Sources whose value differs from `value`
    pub dissenting_sources: Vec<String>,
    pub agreement_score: f64,
    pub single_sourced: bool,
}

impl FactValue {
    pub fn is_disputed(&self) -> bool {
        !self.dissenting_sources.is_empty()
    }
}

/// The merged fact set for one subject across all sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedContext {
    subject: String,
    facts: BTreeMap<Facet, BTreeMap<String, FactValue>>,
}

impl AggregatedContext {
    pub(crate) fn new(
        subject: impl Into<String>,
        facts: BTreeMap<Facet, BTreeMap<String, FactValue>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            facts,
        }
    }

    pub fn empty(subject: impl Into<String>) -> Self {
        Self::new(subject, BTreeMap::new())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn get(&self, facet: Facet, field: &str) -> Option<&FactValue> {
        self.facts.get(&facet).and_then(|fields| fields.get(field))
    }

    /// Facts of a single facet, keyed by field
    pub fn facet_facts(&self, facet: Facet) -> Option<&BTreeMap<String, FactValue>> {
        self.facts.get(&facet).filter(|fields| !fields.is_empty())
    }

    pub fn has_facet(&self, facet: Facet) -> bool {
        self.facet_facts(facet).is_some()
    }

    /// All facts as `(facet, field, value)` in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Facet, &str, &FactValue)> {
        self.facts.iter().flat_map(|(facet, fields)| {
            fields
                .iter()
                .map(move |(field, value)| (*facet, field.as_str(), value))
        })
    }

    pub fn len(&self) -> usize {
        self.facts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every source that supports at least one fact
    pub fn sources(&self) -> BTreeSet<String> {
        self.iter()
            .flat_map(|(_, _, fact)| fact.supporting_sources.iter().cloned())
            .collect()
    }
}

// ============= Report Types =============

/// Derived reliability measure over aggregated contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub overall: f64,
    pub per_facet: BTreeMap<Facet, f64>,
}

impl ConfidenceScore {
    pub fn facet(&self, facet: Facet) -> f64 {
        self.per_facet.get(&facet).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Findings,
    Recommendation,
    Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Facet>,
    pub entries: Vec<String>,
}

/// The terminal artifact of a research run. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub query: String,
    pub query_class: QueryClass,
    pub intents: Vec<ResearchIntent>,
    /// One context per intent subject, in intent order
    pub contexts: Vec<AggregatedContext>,
    pub confidence: ConfidenceScore,
    pub summary: String,
    pub narrative: Vec<ReportSection>,
    pub citations: BTreeSet<String>,
    /// Suggested team members for team-building queries
    pub team: Vec<String>,
    pub limitations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elaboration: Option<String>,
    /// True when the advisory reasoning step was skipped or failed
    pub degraded: bool,
}

impl ResearchReport {
    pub fn context(&self, subject: &str) -> Option<&AggregatedContext> {
        self.contexts.iter().find(|c| c.subject() == subject)
    }

    pub fn section(&self, facet: Facet) -> Option<&ReportSection> {
        self.narrative.iter().find(|s| s.facet == Some(facet))
    }

    pub fn recommendation(&self) -> Option<&ReportSection> {
        self.narrative
            .iter()
            .find(|s| s.kind == SectionKind::Recommendation)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Could not identify any Pokemon or type in query: \"{0}\"")]
    AmbiguousQuery(String),

    #[error("No evidence available for {}: all {failures} source fetches failed", .subjects.join(", "))]
    NoEvidenceAvailable {
        subjects: Vec<String>,
        failures: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResearchError {
    /// Actionable suggestion shown next to fatal errors
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ResearchError::AmbiguousQuery(_) => Some(
                "Rephrase the question with a Pokemon name or a type, e.g. \"What type is Scizor?\"",
            ),
            ResearchError::NoEvidenceAvailable { .. } => Some(
                "Every data source was unavailable. Check your connection and retry in a moment.",
            ),
            ResearchError::Config(_) => Some("Run `pokedex config --validate` to inspect the configuration."),
            _ => None,
        }
    }

    pub fn is_fatal_research_error(&self) -> bool {
        matches!(
            self,
            ResearchError::AmbiguousQuery(_) | ResearchError::NoEvidenceAvailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ResearchError>;

/// Advisory collaborator failure. Consumed by synthesis, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Reasoning unavailable: {0}")]
pub struct ReasoningUnavailable(pub String);
