//! Merging evidence bundles into one conflict-resolved context per subject
//!
//! Values are compared in a normalised form so that `"Electric"` and
//! `" electric "`, or `6` and `6.0`, count as agreement. The merge only ever
//! looks at sorted structures, so the result does not depend on the order in
//! which bundles arrived.

use crate::types::{AggregatedContext, EvidenceBundle, Facet, FactValue, ResearchIntent};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// One source's surviving report for a field
#[derive(Debug, Clone)]
struct Report<'a> {
    trust: f64,
    fetched_at: DateTime<Utc>,
    value: &'a Value,
    canonical: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContextAggregator;

impl ContextAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Merge every bundle about `subject`; other subjects are ignored
    pub fn aggregate(&self, subject: &str, bundles: &[EvidenceBundle]) -> AggregatedContext {
        // facet -> field -> source -> report
        let mut reports: BTreeMap<Facet, BTreeMap<&str, BTreeMap<&str, Report<'_>>>> = BTreeMap::new();

        for bundle in bundles.iter().filter(|b| b.subject == subject) {
            for (field, value) in &bundle.payload {
                if value.is_null() {
                    continue;
                }
                let report = Report {
                    trust: bundle.trust,
                    fetched_at: bundle.fetched_at,
                    value,
                    canonical: canonical(value),
                };

                let by_source = reports
                    .entry(bundle.facet)
                    .or_default()
                    .entry(field.as_str())
                    .or_default();

                let replace = by_source
                    .get(bundle.source_id.as_str())
                    .map_or(true, |existing| supersedes(&report, existing));
                if replace {
                    by_source.insert(bundle.source_id.as_str(), report);
                }
            }
        }

        let facts = reports
            .into_iter()
            .map(|(facet, fields)| {
                let merged = fields
                    .into_iter()
                    .map(|(field, by_source)| (field.to_string(), merge(&by_source)))
                    .collect();
                (facet, merged)
            })
            .collect();

        AggregatedContext::new(subject, facts)
    }

    /// One context per intent, in intent order
    pub fn aggregate_all(&self, intents: &[ResearchIntent], bundles: &[EvidenceBundle]) -> Vec<AggregatedContext> {
        intents
            .iter()
            .map(|intent| self.aggregate(intent.subject(), bundles))
            .collect()
    }
}

/// A later report replaces an earlier one from the same source; equal
/// timestamps fall back to canonical value order, then to the raw value.
fn supersedes(candidate: &Report<'_>, existing: &Report<'_>) -> bool {
    (candidate.fetched_at, &candidate.canonical, candidate.value.to_string())
        > (existing.fetched_at, &existing.canonical, existing.value.to_string())
}

fn merge(by_source: &BTreeMap<&str, Report<'_>>) -> FactValue {
    // Highest trust wins; BTreeMap order makes the smaller id win ties.
    let mut winner: Option<(&str, &Report<'_>)> = None;
    for (source, report) in by_source {
        match winner {
            Some((_, best)) if report.trust <= best.trust => {}
            _ => winner = Some((source, report)),
        }
    }

    let Some((_, chosen)) = winner else {
        return FactValue {
            value: Value::Null,
            supporting_sources: Vec::new(),
            dissenting_sources: Vec::new(),
            agreement_score: 0.0,
            single_sourced: false,
        };
    };

    let mut agreeing = Vec::new();
    let mut dissenting = Vec::new();
    for (source, report) in by_source {
        if report.canonical == chosen.canonical {
            agreeing.push(source.to_string());
        } else {
            dissenting.push(source.to_string());
        }
    }

    let reporting = by_source.len();
    let agreement_score = agreeing.len() as f64 / reporting as f64;

    let mut supporting_sources = agreeing;
    supporting_sources.extend(dissenting.iter().cloned());

    FactValue {
        value: chosen.value.clone(),
        supporting_sources,
        dissenting_sources: dissenting,
        agreement_score,
        single_sourced: reporting == 1,
    }
}

/// Comparison form of a value
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(normalize_text(text)),
        Value::Number(number) => number
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items.iter().map(normalize).collect();
            normalized.sort_by_cached_key(|item| item.to_string());
            Value::Array(normalized)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), normalize(item)))
                .collect(),
        ),
        Value::Bool(_) | Value::Null => value.clone(),
    }
}

fn normalize_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn canonical(value: &Value) -> String {
    normalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn bundle(source: &str, trust: f64, facet: Facet, payload: Value) -> EvidenceBundle {
        EvidenceBundle {
            source_id: source.to_string(),
            subject: "pikachu".to_string(),
            facet,
            payload: serde_json::from_value(payload).unwrap(),
            fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            trust,
        }
    }

    #[test]
    fn test_normalize_text_and_numbers() {
        assert_eq!(normalize(&json!("  Lightning_Rod ")), json!("lightning-rod"));
        assert_eq!(normalize(&json!("Mouse  Pokemon")), json!("mouse-pokemon"));
        assert_eq!(canonical(&json!(6)), canonical(&json!(6.0)));
        assert_eq!(
            canonical(&json!(["Poison", "grass"])),
            canonical(&json!(["grass", "poison"]))
        );
        assert_ne!(canonical(&json!(["grass"])), canonical(&json!(["grass", "grass"])));
    }

    #[test]
    fn test_consensus() {
        let bundles = vec![
            bundle("pokeapi", 0.95, Facet::Typing, json!({"types": ["electric"]})),
            bundle("bulbapedia", 0.8, Facet::Typing, json!({"types": ["Electric"]})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);

        let fact = context.get(Facet::Typing, "types").unwrap();
        assert_eq!(fact.value, json!(["electric"]));
        assert_eq!(fact.agreement_score, 1.0);
        assert!(!fact.single_sourced);
        assert!(!fact.is_disputed());
        assert_eq!(fact.supporting_sources, vec!["bulbapedia", "pokeapi"]);
    }

    #[test]
    fn test_conflict_prefers_trusted_source() {
        let bundles = vec![
            bundle("pokeapi", 0.95, Facet::Stats, json!({"speed": 90})),
            bundle("serebii", 0.75, Facet::Stats, json!({"speed": 100})),
            bundle("pokemondb", 0.7, Facet::Stats, json!({"speed": 90})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);

        let fact = context.get(Facet::Stats, "speed").unwrap();
        assert_eq!(fact.value, json!(90));
        assert!((fact.agreement_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(fact.supporting_sources, vec!["pokeapi", "pokemondb", "serebii"]);
        assert_eq!(fact.dissenting_sources, vec!["serebii"]);
    }

    #[test]
    fn test_trust_tie_goes_to_smaller_id() {
        let bundles = vec![
            bundle("zeta", 0.8, Facet::Lore, json!({"habitat": "forest"})),
            bundle("alpha", 0.8, Facet::Lore, json!({"habitat": "cave"})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);

        let fact = context.get(Facet::Lore, "habitat").unwrap();
        assert_eq!(fact.value, json!("cave"));
        assert_eq!(fact.agreement_score, 0.5);
    }

    #[test]
    fn test_single_source_and_nulls() {
        let bundles = vec![bundle(
            "pokeapi",
            0.95,
            Facet::Lore,
            json!({"genus": "Mouse Pokemon", "habitat": null}),
        )];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);

        let fact = context.get(Facet::Lore, "genus").unwrap();
        assert!(fact.single_sourced);
        assert_eq!(fact.agreement_score, 1.0);
        assert!(context.get(Facet::Lore, "habitat").is_none());
    }

    #[test]
    fn test_other_subjects_ignored() {
        let mut other = bundle("pokeapi", 0.95, Facet::Typing, json!({"types": ["fire"]}));
        other.subject = "charmander".to_string();

        let context = ContextAggregator::new().aggregate("pikachu", &[other]);
        assert!(context.is_empty());
    }

    #[test]
    fn test_duplicate_reports_keep_latest() {
        let older = bundle("pokeapi", 0.95, Facet::Stats, json!({"hp": 30}));
        let mut newer = bundle("pokeapi", 0.95, Facet::Stats, json!({"hp": 35}));
        newer.fetched_at = older.fetched_at + chrono::Duration::seconds(5);

        let forward = ContextAggregator::new().aggregate("pikachu", &[older.clone(), newer.clone()]);
        let backward = ContextAggregator::new().aggregate("pikachu", &[newer, older]);

        assert_eq!(forward.get(Facet::Stats, "hp").unwrap().value, json!(35));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_same_source_spelling_variants_resolve_independent_of_order() {
        let lower = bundle("serebii", 0.75, Facet::Typing, json!({"types": ["electric"]}));
        let upper = bundle("serebii", 0.75, Facet::Typing, json!({"types": ["Electric"]}));

        let forward = ContextAggregator::new().aggregate("pikachu", &[lower.clone(), upper.clone()]);
        let backward = ContextAggregator::new().aggregate("pikachu", &[upper, lower]);

        assert_eq!(forward, backward);
        assert_eq!(forward.get(Facet::Typing, "types").unwrap().value, json!(["electric"]));
    }
}
