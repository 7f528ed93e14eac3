use crate::{
    sources::{EvidenceSource, FetchResult, SourceRegistry},
    types::{EvidenceBundle, Facet, ResearchError, ResearchIntent, Result, SourceFailure},
    utils::toml_config::PipelineConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::instrument;

/// What happened to one (intent, facet, source) fetch
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    /// Position of the intent in the clarified plan
    pub intent_index: usize,
    pub subject: String,
    pub facet: Facet,
    pub source_id: String,
    pub attempts: u32,
    pub latency: Duration,
    pub result: FetchResult,
}

impl SourceOutcome {
    pub fn bundle(&self) -> Option<&EvidenceBundle> {
        self.result.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&SourceFailure> {
        self.result.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Bundles out of a set of outcomes, in outcome order
pub fn bundles(outcomes: &[SourceOutcome]) -> Vec<EvidenceBundle> {
    outcomes.iter().filter_map(|o| o.bundle().cloned()).collect()
}

/// One scheduled fetch
struct Dispatch {
    intent_index: usize,
    intent: ResearchIntent,
    facet: Facet,
    source: Arc<dyn EvidenceSource>,
}

/// Retry and timeout limits shared by every task of one collection
#[derive(Clone, Copy)]
struct CallPolicy {
    deadline: Instant,
    call_timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

pub struct SourceCoordinator {
    config: PipelineConfig,
}

impl SourceCoordinator {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch every supported (intent, facet, source) triple concurrently.
    ///
    /// Outcomes are sorted by intent, facet and source id. Fetches still
    /// pending when `budget` runs out are aborted and recorded as timeouts.
    /// Fails only when not a single fetch succeeded.
    #[instrument(skip(self, intents, sources), fields(intents = intents.len(), sources = sources.len()))]
    pub async fn collect(
        &self,
        intents: &[ResearchIntent],
        sources: &SourceRegistry,
        budget: Duration,
    ) -> Result<Vec<SourceOutcome>> {
        let started = Instant::now();
        let deadline = started + budget;
        let config = self.config.clone().with_budget(budget);

        let dispatches: Vec<Dispatch> = intents
            .iter()
            .enumerate()
            .flat_map(|(intent_index, intent)| {
                intent.facets().iter().flat_map(move |facet| {
                    sources
                        .iter()
                        .filter(move |source| source.supports(*facet))
                        .map(move |source| Dispatch {
                            intent_index,
                            intent: intent.clone(),
                            facet: *facet,
                            source: Arc::clone(source),
                        })
                })
            })
            .collect();

        tracing::info!("Dispatching {} fetches within {}ms", dispatches.len(), budget.as_millis());

        let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        let mut set = JoinSet::new();

        for (slot, dispatch) in dispatches.iter().enumerate() {
            let source = Arc::clone(&dispatch.source);
            let intent = dispatch.intent.clone();
            let facet = dispatch.facet;
            let semaphore = Arc::clone(&semaphore);
            let policy = CallPolicy {
                deadline,
                call_timeout: config.call_timeout(source.priority()),
                max_retries: config.max_retries,
                backoff_base: config.backoff_base(),
            };

            set.spawn(async move {
                let (attempts, latency, result) =
                    fetch_with_retry(source, intent, facet, semaphore, policy).await;
                (slot, attempts, latency, result)
            });
        }

        let mut slots: Vec<Option<(u32, Duration, FetchResult)>> = vec![None; dispatches.len()];
        let mut budget_exhausted = false;

        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((slot, attempts, latency, result)))) => {
                    slots[slot] = Some((attempts, latency, result));
                }
                Ok(Some(Err(e))) => {
                    tracing::warn!("Fetch task failed: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    budget_exhausted = true;
                    tracing::warn!("Research budget exhausted, aborting {} pending fetches", set.len());
                    set.abort_all();
                    break;
                }
            }
        }

        let mut outcomes: Vec<SourceOutcome> = dispatches
            .into_iter()
            .zip(slots)
            .map(|(dispatch, slot)| {
                let source_id = dispatch.source.id().to_string();
                let (attempts, latency, result) = slot.unwrap_or_else(|| {
                    let failure = if budget_exhausted {
                        SourceFailure::timeout(&source_id, "cancelled when the research budget ran out")
                    } else {
                        SourceFailure::new(
                            &source_id,
                            crate::types::FailureKind::Unreachable,
                            "fetch task did not complete",
                        )
                    };
                    (0, started.elapsed(), Err(failure))
                });

                SourceOutcome {
                    intent_index: dispatch.intent_index,
                    subject: dispatch.intent.subject().to_string(),
                    facet: dispatch.facet,
                    source_id,
                    attempts,
                    latency,
                    result,
                }
            })
            .collect();

        outcomes.sort_by(|a, b| {
            (a.intent_index, a.facet, a.source_id.as_str())
                .cmp(&(b.intent_index, b.facet, b.source_id.as_str()))
        });

        for outcome in &outcomes {
            if let Some(failure) = outcome.failure() {
                tracing::warn!(
                    subject = %outcome.subject,
                    facet = %outcome.facet,
                    attempts = outcome.attempts,
                    "Source failed: {}",
                    failure
                );
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            "Collected {} bundles, {} failures in {}ms",
            succeeded,
            outcomes.len() - succeeded,
            started.elapsed().as_millis()
        );

        if succeeded == 0 {
            return Err(ResearchError::NoEvidenceAvailable {
                subjects: intents.iter().map(|i| i.subject().to_string()).collect(),
                failures: outcomes.len(),
            });
        }

        Ok(outcomes)
    }
}

/// Run one fetch, retrying retriable failures while the budget allows
async fn fetch_with_retry(
    source: Arc<dyn EvidenceSource>,
    intent: ResearchIntent,
    facet: Facet,
    semaphore: Arc<Semaphore>,
    policy: CallPolicy,
) -> (u32, Duration, FetchResult) {
    let started = Instant::now();

    let mut attempts = 0;
    loop {
        // One permit per attempt; backoff sleeps hold no slot.
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let failure = SourceFailure::new(
                    source.id(),
                    crate::types::FailureKind::Unreachable,
                    "fetch pool closed",
                );
                return (attempts, started.elapsed(), Err(failure));
            }
        };

        let remaining = policy.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            let failure = SourceFailure::timeout(source.id(), "research budget exhausted before the call");
            return (attempts, started.elapsed(), Err(failure));
        }
        let timeout = policy.call_timeout.min(remaining);
        attempts += 1;

        tracing::debug!(
            source = source.id(),
            subject = intent.subject(),
            facet = %facet,
            attempt = attempts,
            "Fetching with {}ms timeout",
            timeout.as_millis()
        );

        // Adapters are expected to honour the timeout; enforce it regardless.
        let result = match tokio::time::timeout(timeout, source.fetch(&intent, facet, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(SourceFailure::timeout(
                source.id(),
                format!("no response within {}ms", timeout.as_millis()),
            )),
        };

        drop(permit);

        match result {
            Err(failure) if failure.retriable && attempts <= policy.max_retries => {
                let backoff = policy.backoff_base * 2u32.saturating_pow(attempts - 1);
                let remaining = policy.deadline.saturating_duration_since(Instant::now());
                if backoff >= remaining {
                    return (attempts, started.elapsed(), Err(failure));
                }
                tracing::debug!(
                    source = source.id(),
                    "Retrying after {}ms: {}",
                    backoff.as_millis(),
                    failure
                );
                tokio::time::sleep(backoff).await;
            }
            result => return (attempts, started.elapsed(), result),
        }
    }
}
