//! Report synthesis
//!
//! Turns aggregated contexts and their confidence into a [`ResearchReport`].
//! Everything in the report is derived from the facts; the optional
//! reasoning collaborator only adds an elaboration and can never fail the
//! report.

use super::taxonomy::{self, TEAM_STRATEGIES};
use crate::llm::ReasoningCollaborator;
use crate::types::{
    parse_type_search, AggregatedContext, ConfidenceScore, Facet, FactValue, QueryClass,
    ReportSection, ResearchPlan, ResearchReport, SectionKind,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Overall confidence below which the report warns the reader
const LOW_CONFIDENCE: f64 = 0.5;

const STAT_FIELDS: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

pub struct SynthesisEngine {
    reasoner: Option<Arc<dyn ReasoningCollaborator>>,
    team_size: usize,
}

impl Default for SynthesisEngine {
    fn default() -> Self {
        Self::new(6)
    }
}

impl SynthesisEngine {
    pub fn new(team_size: usize) -> Self {
        Self {
            reasoner: None,
            team_size: team_size.max(1),
        }
    }

    pub fn with_reasoner(mut self, reasoner: Arc<dyn ReasoningCollaborator>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn has_reasoner(&self) -> bool {
        self.reasoner.is_some()
    }

    /// Build the report. Never fails; a missing or failing reasoner only
    /// marks the report as degraded.
    pub async fn synthesize(
        &self,
        plan: &ResearchPlan,
        contexts: Vec<AggregatedContext>,
        confidence: ConfidenceScore,
    ) -> ResearchReport {
        let mut narrative: Vec<ReportSection> = plan
            .requested_facets()
            .into_iter()
            .map(|facet| findings_section(facet, &contexts))
            .collect();

        if plan.query_class == QueryClass::Training {
            if let Some(section) = training_section(&contexts) {
                narrative.push(section);
            }
        }

        let mut team = Vec::new();
        if plan.query_class.wants_recommendation() {
            team = team_members(&contexts, self.team_size);
            narrative.push(recommendation_section(&team, &contexts));
        }

        let citations: BTreeSet<String> = contexts.iter().flat_map(|c| c.sources()).collect();
        let limitations = limitations(plan, &contexts, &confidence);
        let summary = summary(plan, &contexts, &citations, &confidence);

        let (elaboration, degraded) = match &self.reasoner {
            Some(reasoner) => {
                let digest = digest(plan, &narrative);
                match reasoner.elaborate(&digest).await {
                    Ok(text) => (Some(text), false),
                    Err(e) => {
                        tracing::warn!("Continuing without reasoning: {}", e);
                        (None, true)
                    }
                }
            }
            None => (None, true),
        };

        tracing::info!(
            sections = narrative.len(),
            citations = citations.len(),
            degraded,
            "Synthesized report"
        );

        ResearchReport {
            query: plan.query.clone(),
            query_class: plan.query_class,
            intents: plan.intents.clone(),
            contexts,
            confidence,
            summary,
            narrative,
            citations,
            team,
            limitations,
            elaboration,
            degraded,
        }
    }
}

// ============= Formatting Helpers =============

/// "bug-type-search" -> "Bug type", "mr-mime" -> "Mr Mime"
pub fn display_subject(subject: &str) -> String {
    match parse_type_search(subject) {
        Some(type_name) => format!("{} type", capitalize(type_name)),
        None => subject
            .split('-')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn fact_entry(subject: &str, field: &str, fact: &FactValue) -> String {
    let mut entry = format!(
        "{}: {} = {} [{}; agreement {:.0}%]",
        display_subject(subject),
        field,
        display_value(&fact.value),
        fact.supporting_sources.join(", "),
        fact.agreement_score * 100.0
    );
    if fact.is_disputed() {
        entry.push_str(&format!(" (disputed by {})", fact.dissenting_sources.join(", ")));
    }
    entry
}

fn findings_section(facet: Facet, contexts: &[AggregatedContext]) -> ReportSection {
    let mut entries: Vec<String> = contexts
        .iter()
        .filter_map(|context| {
            context
                .facet_facts(facet)
                .map(|fields| (context.subject(), fields))
        })
        .flat_map(|(subject, fields)| {
            fields
                .iter()
                .map(move |(field, fact)| fact_entry(subject, field, fact))
        })
        .collect();

    if entries.is_empty() {
        entries.push(format!("No source returned {} data.", facet.title().to_lowercase()));
    }

    ReportSection {
        kind: SectionKind::Findings,
        title: facet.title().to_string(),
        facet: Some(facet),
        entries,
    }
}

// ============= Team Recommendation =============

fn string_list(fact: Option<&FactValue>) -> Vec<String> {
    match fact.map(|f| &f.value) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .collect(),
        Some(Value::String(text)) => vec![text.trim().to_lowercase()],
        _ => Vec::new(),
    }
}

/// Members of searched types first, then named subjects
fn team_members(contexts: &[AggregatedContext], team_size: usize) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();

    for context in contexts.iter().filter(|c| parse_type_search(c.subject()).is_some()) {
        for name in string_list(context.get(Facet::Typing, "members")) {
            if !members.contains(&name) {
                members.push(name);
            }
        }
    }
    for context in contexts.iter().filter(|c| parse_type_search(c.subject()).is_none()) {
        let name = context.subject().to_string();
        if !members.contains(&name) {
            members.push(name);
        }
    }

    members.truncate(team_size);
    members
}

fn team_types(contexts: &[AggregatedContext]) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    for context in contexts {
        match parse_type_search(context.subject()) {
            Some(type_name) => {
                types.insert(type_name.to_string());
            }
            None => types.extend(string_list(context.get(Facet::Typing, "types"))),
        }
    }
    types.retain(|t| taxonomy::is_type(t));
    types
}

/// Attacking types that hit a team type and that no team type beats
fn uncovered_weaknesses(types: &BTreeSet<String>) -> BTreeSet<&'static str> {
    types
        .iter()
        .flat_map(|t| taxonomy::weak_to(t))
        .filter(|attacker| {
            !types
                .iter()
                .any(|own| taxonomy::strong_against(own).contains(attacker))
        })
        .collect()
}

fn recommendation_section(team: &[String], contexts: &[AggregatedContext]) -> ReportSection {
    let mut entries = Vec::new();

    if team.is_empty() {
        entries.push("No team members could be confirmed from the sources.".to_string());
    } else {
        entries.push(format!(
            "Suggested team: {}",
            team.iter().map(|m| display_subject(m)).collect::<Vec<_>>().join(", ")
        ));
    }

    let types = team_types(contexts);
    if !types.is_empty() {
        entries.push(format!(
            "Team types: {}",
            types.iter().cloned().collect::<Vec<_>>().join(", ")
        ));

        let weaknesses = uncovered_weaknesses(&types);
        if weaknesses.is_empty() {
            entries.push("No uncovered type weaknesses.".to_string());
        } else {
            entries.push(format!(
                "Uncovered weaknesses: {}",
                weaknesses.iter().copied().collect::<Vec<_>>().join(", ")
            ));
            for attacker in &weaknesses {
                let counters: Vec<&str> = taxonomy::TYPE_ADVANTAGES
                    .iter()
                    .filter(|(_, targets)| targets.contains(attacker))
                    .map(|(name, _)| *name)
                    .collect();
                if !counters.is_empty() {
                    entries.push(format!(
                        "Cover {} with a {} type",
                        attacker,
                        counters.join(" or ")
                    ));
                }
            }
        }
    }

    entries.extend(TEAM_STRATEGIES.iter().map(|s| format!("Strategy: {}", s)));

    ReportSection {
        kind: SectionKind::Recommendation,
        title: "Recommendation".to_string(),
        facet: None,
        entries,
    }
}

// ============= Training Analysis =============

fn stat_total(context: &AggregatedContext) -> Option<i64> {
    let values: Vec<i64> = STAT_FIELDS
        .iter()
        .filter_map(|field| context.get(Facet::Stats, field)?.value.as_f64())
        .map(|v| v as i64)
        .collect();
    (values.len() == STAT_FIELDS.len()).then(|| values.iter().sum())
}

/// Ranks candidates by base stat total
fn training_section(contexts: &[AggregatedContext]) -> Option<ReportSection> {
    let mut ranked: Vec<(&str, i64)> = contexts
        .iter()
        .filter_map(|c| stat_total(c).map(|total| (c.subject(), total)))
        .collect();
    if ranked.is_empty() {
        return None;
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut entries: Vec<String> = ranked
        .iter()
        .map(|(subject, total)| format!("{}: base stat total {}", display_subject(subject), total))
        .collect();
    entries.insert(
        0,
        format!(
            "Strongest starting pick: {}",
            display_subject(ranked[0].0)
        ),
    );

    Some(ReportSection {
        kind: SectionKind::Analysis,
        title: "Training Analysis".to_string(),
        facet: None,
        entries,
    })
}

// ============= Summary & Limitations =============

fn summary(
    plan: &ResearchPlan,
    contexts: &[AggregatedContext],
    citations: &BTreeSet<String>,
    confidence: &ConfidenceScore,
) -> String {
    let subjects: Vec<String> = plan.subjects().iter().map(|s| display_subject(s)).collect();
    let facts: usize = contexts.iter().map(AggregatedContext::len).sum();
    let lead = match plan.query_class {
        QueryClass::TeamBuilding => "Team research",
        QueryClass::Training => "Training research",
        QueryClass::Discovery => "Discovery research",
        QueryClass::Strategy => "Strategy research",
        QueryClass::Lore => "Lore research",
        QueryClass::General => "Research",
    };

    format!(
        "{} on {}: {} facts from {} source{}, overall confidence {:.0}%.",
        lead,
        subjects.join(", "),
        facts,
        citations.len(),
        if citations.len() == 1 { "" } else { "s" },
        confidence.overall * 100.0
    )
}

fn limitations(
    plan: &ResearchPlan,
    contexts: &[AggregatedContext],
    confidence: &ConfidenceScore,
) -> Vec<String> {
    let mut notes = Vec::new();

    for intent in &plan.intents {
        let context = contexts.iter().find(|c| c.subject() == intent.subject());
        for facet in intent.facets() {
            if !context.is_some_and(|c| c.has_facet(*facet)) {
                notes.push(format!(
                    "No {} data found for {}",
                    facet.title().to_lowercase(),
                    display_subject(intent.subject())
                ));
            }
        }
    }

    for context in contexts {
        for (_, field, fact) in context.iter().filter(|(_, _, f)| f.is_disputed()) {
            notes.push(format!(
                "{} {} is disputed: {} reported a different value",
                display_subject(context.subject()),
                field,
                fact.dissenting_sources.join(", ")
            ));
        }
    }

    if confidence.overall < LOW_CONFIDENCE {
        notes.push("Overall confidence is low; verify key facts before relying on them".to_string());
    }

    notes
}

/// Plain-text prompt for the reasoning collaborator
fn digest(plan: &ResearchPlan, narrative: &[ReportSection]) -> String {
    let mut text = format!("Question: {}\n\nVerified findings:\n", plan.query);
    for section in narrative {
        text.push_str(&format!("\n## {}\n", section.title));
        for entry in &section.entries {
            text.push_str(&format!("- {}\n", entry));
        }
    }
    text
}
