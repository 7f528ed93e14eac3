//! Goal clarification: free-form question to research intents
//!
//! Pure keyword matching against the static [`taxonomy`](super::taxonomy);
//! no I/O, so an ambiguous query fails before any source is contacted.

use super::taxonomy::{self, CLASS_KEYWORDS, EARLY_GAME_ROSTER, FACET_KEYWORDS};
use crate::types::{
    type_search_subject, Facet, QueryClass, ResearchError, ResearchIntent, ResearchPlan, Result,
};

/// Words after a type name that turn it into a type search ("bug type")
const TYPE_MARKERS: [&str; 4] = ["type", "types", "typed", "pokemon"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Subject {
    Named(String),
    TypeSearch(String),
}

impl Subject {
    fn key(&self) -> String {
        match self {
            Subject::Named(name) => name.clone(),
            Subject::TypeSearch(type_name) => type_search_subject(type_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoalClarifier {
    max_subjects: usize,
}

impl Default for GoalClarifier {
    fn default() -> Self {
        Self::new(6)
    }
}

impl GoalClarifier {
    pub fn new(max_subjects: usize) -> Self {
        Self {
            max_subjects: max_subjects.max(1),
        }
    }

    /// Intents for a raw query. Fails only when no subject can be found.
    pub fn clarify(&self, raw: &str) -> Result<Vec<ResearchIntent>> {
        self.plan(raw).map(|plan| plan.intents)
    }

    /// Full plan: query class plus ordered intents
    pub fn plan(&self, raw: &str) -> Result<ResearchPlan> {
        let tokens = tokenize(raw);
        let query_class = classify(&tokens);
        let extra_facets = keyword_facets(&tokens);

        let mut subjects = find_subjects(&tokens, query_class);
        if subjects.is_empty() && query_class == QueryClass::Training {
            subjects = EARLY_GAME_ROSTER
                .iter()
                .map(|name| Subject::Named(name.to_string()))
                .collect();
        }
        subjects.truncate(self.max_subjects);

        if subjects.is_empty() {
            return Err(ResearchError::AmbiguousQuery(raw.trim().to_string()));
        }

        let intents: Vec<ResearchIntent> = subjects
            .iter()
            .map(|subject| match subject {
                Subject::Named(name) => ResearchIntent::new(
                    name.clone(),
                    taxonomy::default_facets(query_class)
                        .iter()
                        .copied()
                        .chain(extra_facets.iter().copied()),
                ),
                Subject::TypeSearch(_) => ResearchIntent::new(subject.key(), [Facet::Typing]),
            })
            .collect();

        tracing::debug!(
            query_class = ?query_class,
            subjects = ?intents.iter().map(|i| i.subject()).collect::<Vec<_>>(),
            "Clarified query"
        );

        Ok(ResearchPlan {
            query: raw.trim().to_string(),
            query_class,
            intents,
        })
    }
}

/// Lowercased words; dots and apostrophes are dropped so "Mr. Mime" and
/// "Farfetch'd" line up with roster spelling
fn tokenize(raw: &str) -> Vec<String> {
    raw.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '\'' | '’'))
        .collect::<String>()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|token| token.trim_matches('-'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn classify(tokens: &[String]) -> QueryClass {
    CLASS_KEYWORDS
        .iter()
        .find(|(_, keywords)| tokens.iter().any(|t| keywords.contains(&t.as_str())))
        .map(|(class, _)| *class)
        .unwrap_or(QueryClass::General)
}

/// Facets asked for explicitly, in canonical order
fn keyword_facets(tokens: &[String]) -> Vec<Facet> {
    FACET_KEYWORDS
        .iter()
        .filter(|(_, keywords)| tokens.iter().any(|t| keywords.contains(&t.as_str())))
        .map(|(facet, _)| *facet)
        .collect()
}

fn pokemon_name(token: &str) -> Option<String> {
    if taxonomy::is_pokemon(token) {
        return Some(token.to_string());
    }
    ["es", "s"]
        .iter()
        .filter_map(|suffix| token.strip_suffix(suffix))
        .find(|stem| taxonomy::is_pokemon(stem))
        .map(str::to_string)
}

fn type_mention(token: &str, next: Option<&str>) -> Option<String> {
    for suffix in ["-types", "-type"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            if taxonomy::is_type(stem) {
                return Some(stem.to_string());
            }
        }
    }
    match next {
        Some(next) if taxonomy::is_type(token) && TYPE_MARKERS.contains(&next) => {
            Some(token.to_string())
        }
        _ => None,
    }
}

fn find_subjects(tokens: &[String], class: QueryClass) -> Vec<Subject> {
    let mut subjects: Vec<Subject> = Vec::new();
    let mut push = |subject: Subject| {
        if !subjects.iter().any(|s| s.key() == subject.key()) {
            subjects.push(subject);
        }
    };

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);

        if let Some(next) = next {
            let joined = format!("{}-{}", token, next);
            if let Some(name) = pokemon_name(&joined) {
                push(Subject::Named(name));
                i += 2;
                continue;
            }
        }

        if let Some(type_name) = type_mention(token, next) {
            push(Subject::TypeSearch(type_name));
        } else if let Some(name) = pokemon_name(token) {
            push(Subject::Named(name));
        } else if class == QueryClass::Discovery {
            if let Some(type_name) = taxonomy::habitat_type(token) {
                push(Subject::TypeSearch(type_name.to_string()));
            }
        }
        i += 1;
    }

    subjects
}
