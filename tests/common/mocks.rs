//! Mock implementations for testing.
//!
//! Scripted evidence sources, LLM clients and reasoners that can be shared
//! across test files without duplication.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pokedex::llm::{LLMClient, ReasoningCollaborator};
use pokedex::sources::{EvidenceSource, FetchResult, SourcePriority};
use pokedex::types::{
    EvidenceBundle, Facet, FailureKind, ReasoningUnavailable, ResearchError, ResearchIntent, Result,
    SourceFailure,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a [`MockSource`] answers
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return the scripted payload, or `NotFound` when none is scripted
    Respond,
    /// Sleep first, then respond
    Delay(Duration),
    /// Fail every call with the given reason
    Fail(FailureKind),
    /// Fail the first `n` calls with the given reason, then respond
    FailTimes(usize, FailureKind),
    /// Never return; the coordinator must cut it off
    Hang,
}

/// Evidence source with scripted payloads.
///
/// # Examples
///
/// ```ignore
/// let source = MockSource::structured("pokeapi", 0.95)
///     .with_payload("scizor", Facet::Typing, json!({"types": ["bug", "steel"]}));
///
/// let hanging = MockSource::scraped("serebii", 0.75).with_behavior(Behavior::Hang);
/// ```
pub struct MockSource {
    id: String,
    trust: f64,
    priority: SourcePriority,
    unsupported: Vec<Facet>,
    payloads: HashMap<(String, Facet), BTreeMap<String, Value>>,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<(String, Facet)>>>,
}

impl MockSource {
    pub fn structured(id: &str, trust: f64) -> Self {
        Self::new(id, trust, SourcePriority::Structured)
    }

    pub fn scraped(id: &str, trust: f64) -> Self {
        Self::new(id, trust, SourcePriority::Scraped)
    }

    fn new(id: &str, trust: f64, priority: SourcePriority) -> Self {
        Self {
            id: id.to_string(),
            trust,
            priority,
            unsupported: Vec::new(),
            payloads: HashMap::new(),
            behavior: Behavior::Respond,
            calls: Arc::new(AtomicUsize::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the payload for one subject and facet. `payload` must be a JSON object.
    pub fn with_payload(mut self, subject: &str, facet: Facet, payload: Value) -> Self {
        let fields = match payload {
            Value::Object(map) => map.into_iter().collect(),
            other => panic!("payload must be an object, got {}", other),
        };
        self.payloads.insert((subject.to_string(), facet), fields);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn without_facet(mut self, facet: Facet) -> Self {
        self.unsupported.push(facet);
        self
    }

    /// Shared call counter, readable after the source moves into a registry
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared log of `(subject, facet)` per call
    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, Facet)>>> {
        Arc::clone(&self.log)
    }

    fn respond(&self, intent: &ResearchIntent, facet: Facet) -> FetchResult {
        match self.payloads.get(&(intent.subject().to_string(), facet)) {
            Some(payload) => Ok(EvidenceBundle {
                source_id: self.id.clone(),
                subject: intent.subject().to_string(),
                facet,
                payload: payload.clone(),
                fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                trust: self.trust,
            }),
            None => Err(SourceFailure::new(
                &self.id,
                FailureKind::NotFound,
                format!("no {} data for {}", facet, intent.subject()),
            )),
        }
    }
}

#[async_trait]
impl EvidenceSource for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn trust(&self) -> f64 {
        self.trust
    }

    fn priority(&self) -> SourcePriority {
        self.priority
    }

    fn supports(&self, facet: Facet) -> bool {
        !self.unsupported.contains(&facet)
    }

    async fn fetch(&self, intent: &ResearchIntent, facet: Facet, _timeout: Duration) -> FetchResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .push((intent.subject().to_string(), facet));

        match &self.behavior {
            Behavior::Respond => self.respond(intent, facet),
            Behavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                self.respond(intent, facet)
            }
            Behavior::Fail(reason) => Err(SourceFailure::new(&self.id, *reason, "scripted failure")),
            Behavior::FailTimes(times, reason) if call < *times => {
                Err(SourceFailure::new(&self.id, *reason, "scripted failure"))
            }
            Behavior::FailTimes(..) => self.respond(intent, facet),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Mock LLM client returning a canned reply, or always failing.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(ResearchError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.generate("").await
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Reasoner that records every digest it receives
#[derive(Default)]
pub struct RecordingReasoner {
    pub fail: bool,
    pub digests: Mutex<Vec<String>>,
}

#[async_trait]
impl ReasoningCollaborator for RecordingReasoner {
    async fn elaborate(&self, summary: &str) -> std::result::Result<String, ReasoningUnavailable> {
        self.digests.lock().unwrap().push(summary.to_string());
        if self.fail {
            Err(ReasoningUnavailable("scripted outage".to_string()))
        } else {
            Ok("Bug types pair well with Flying and Steel partners.".to_string())
        }
    }
}
