//! Confidence scoring over aggregated contexts
//!
//! A facet scores the mean agreement of its fields, discounted when a single
//! source contributed every fact in it. Facet scores are then scaled by how
//! much of the requested research actually came back.

use crate::types::{AggregatedContext, ConfidenceScore, Facet, ResearchIntent};
use crate::utils::toml_config::ScoringConfig;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a single context against the intents that asked for it.
    ///
    /// Intents about other subjects count as unanswered requests.
    pub fn score(&self, context: &AggregatedContext, intents: &[ResearchIntent]) -> ConfidenceScore {
        self.score_all(std::slice::from_ref(context), intents)
    }

    /// Score a multi-subject result; each intent is matched to the context
    /// with the same subject
    pub fn score_all(&self, contexts: &[AggregatedContext], intents: &[ResearchIntent]) -> ConfidenceScore {
        // (facet, raw facet score) for every requested (intent, facet) pair
        let requests: Vec<(Facet, f64)> = intents
            .iter()
            .flat_map(|intent| {
                let context = contexts.iter().find(|c| c.subject() == intent.subject());
                intent
                    .facets()
                    .iter()
                    .map(move |facet| (*facet, context.map_or(0.0, |c| self.facet_score(c, *facet))))
            })
            .collect();

        if requests.is_empty() {
            return ConfidenceScore {
                overall: 0.0,
                per_facet: BTreeMap::new(),
            };
        }

        let missing = requests.iter().filter(|(_, score)| *score == 0.0).count();
        let coverage = 1.0 - self.config.coverage_penalty * (missing as f64 / requests.len() as f64);

        // facet -> (sum, count)
        let mut totals: BTreeMap<Facet, (f64, usize)> = BTreeMap::new();
        for (facet, score) in &requests {
            let entry = totals.entry(*facet).or_insert((0.0, 0));
            entry.0 += score * coverage;
            entry.1 += 1;
        }

        let per_facet: BTreeMap<Facet, f64> = totals
            .iter()
            .map(|(facet, (sum, count))| (*facet, clamp_unit(sum / *count as f64)))
            .collect();

        let weighted: f64 = totals.values().map(|(sum, _)| sum).sum();
        let overall = clamp_unit(weighted / requests.len() as f64);

        tracing::debug!(overall, missing, requests = requests.len(), "Scored confidence");

        ConfidenceScore { overall, per_facet }
    }

    /// Mean field agreement of one facet, 0 when the facet has no facts.
    ///
    /// The single-source multiplier applies to the facet as a whole, so a
    /// field only one source reports does not drag down a facet that several
    /// sources corroborate.
    fn facet_score(&self, context: &AggregatedContext, facet: Facet) -> f64 {
        let Some(fields) = context.facet_facts(facet) else {
            return 0.0;
        };
        if fields.is_empty() {
            return 0.0;
        }

        let agreement: f64 = fields.values().map(|fact| fact.agreement_score).sum::<f64>() / fields.len() as f64;

        let sources: BTreeSet<&str> = fields
            .values()
            .flat_map(|fact| fact.supporting_sources.iter().map(String::as_str))
            .collect();
        let penalty = if sources.len() == 1 {
            self.config.single_source_multiplier
        } else {
            1.0
        };

        agreement * penalty
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::aggregator::ContextAggregator;
    use crate::types::EvidenceBundle;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn bundle(source: &str, trust: f64, facet: Facet, payload: Value) -> EvidenceBundle {
        EvidenceBundle {
            source_id: source.to_string(),
            subject: "pikachu".to_string(),
            facet,
            payload: serde_json::from_value(payload).unwrap(),
            fetched_at: Utc::now(),
            trust,
        }
    }

    fn scorer() -> ConfidenceScorer {
        ConfidenceScorer::default()
    }

    #[test]
    fn test_full_agreement_scores_one() {
        let bundles = vec![
            bundle("a", 0.9, Facet::Typing, json!({"types": ["electric"]})),
            bundle("b", 0.8, Facet::Typing, json!({"types": ["electric"]})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Typing])];

        let score = scorer().score(&context, &intents);
        assert_eq!(score.overall, 1.0);
        assert_eq!(score.facet(Facet::Typing), 1.0);
    }

    #[test]
    fn test_single_source_is_discounted() {
        let bundles = vec![bundle("a", 0.9, Facet::Typing, json!({"types": ["electric"]}))];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Typing])];

        let score = scorer().score(&context, &intents);
        assert!((score.overall - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_missing_facet_penalises_coverage() {
        let bundles = vec![
            bundle("a", 0.9, Facet::Typing, json!({"types": ["electric"]})),
            bundle("b", 0.8, Facet::Typing, json!({"types": ["electric"]})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Typing, Facet::Lore])];

        let score = scorer().score(&context, &intents);
        // coverage = 1 - 0.5 * 1/2
        assert!((score.facet(Facet::Typing) - 0.75).abs() < 1e-9);
        assert_eq!(score.facet(Facet::Lore), 0.0);
        assert!((score.overall - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_intent_counts_as_missing() {
        let context = AggregatedContext::empty("pikachu");
        let intents = vec![ResearchIntent::new("raichu", [Facet::Stats])];

        let score = scorer().score(&context, &intents);
        assert_eq!(score.overall, 0.0);
    }

    #[test]
    fn test_no_intents() {
        let score = scorer().score_all(&[], &[]);
        assert_eq!(score.overall, 0.0);
        assert!(score.per_facet.is_empty());
    }

    #[test]
    fn test_multiplier_is_configurable() {
        let bundles = vec![bundle("a", 0.9, Facet::Lore, json!({"genus": "Mouse"}))];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Lore])];

        let lenient = ConfidenceScorer::new(ScoringConfig {
            single_source_multiplier: 0.9,
            ..ScoringConfig::default()
        });
        assert!(lenient.score(&context, &intents).overall > scorer().score(&context, &intents).overall);
    }

    #[test]
    fn test_field_from_one_source_in_corroborated_facet_is_not_discounted() {
        let bundles = vec![
            bundle("a", 0.9, Facet::Typing, json!({"types": ["electric"]})),
            bundle("b", 0.8, Facet::Typing, json!({"types": ["electric"], "abilities": ["static"]})),
        ];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Typing])];

        assert_eq!(scorer().score(&context, &intents).facet(Facet::Typing), 1.0);
    }

    #[test]
    fn test_facet_from_one_source_is_discounted_once() {
        let bundles = vec![bundle(
            "a",
            0.9,
            Facet::Stats,
            json!({"hp": 35, "attack": 55, "speed": 90}),
        )];
        let context = ContextAggregator::new().aggregate("pikachu", &bundles);
        let intents = vec![ResearchIntent::new("pikachu", [Facet::Stats])];

        assert!((scorer().score(&context, &intents).facet(Facet::Stats) - 0.7).abs() < 1e-9);
    }
}
