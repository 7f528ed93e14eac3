//! Advisory reasoning over structured findings
//!
//! The synthesis engine hands a plain-text digest of the aggregated facts to
//! a [`ReasoningCollaborator`] and folds the reply into the report. Failure
//! is expected and never fatal.

use crate::llm::client::LLMClient;
use crate::types::ReasoningUnavailable;
use async_trait::async_trait;
use std::time::Duration;

const REASONING_SYSTEM_PROMPT: &str = "You are a Pokemon research analyst. \
Using only the verified findings provided, write a short analysis that answers the question. \
Do not invent facts that are not in the findings. Mention uncertainty where sources disagree.";

#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    /// Elaborate on a digest of findings
    async fn elaborate(&self, summary: &str) -> std::result::Result<String, ReasoningUnavailable>;
}

/// Reasoning backed by a chat model
pub struct LlmReasoner {
    client: Box<dyn LLMClient>,
    timeout: Duration,
}

impl LlmReasoner {
    pub fn new(client: Box<dyn LLMClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

#[async_trait]
impl ReasoningCollaborator for LlmReasoner {
    async fn elaborate(&self, summary: &str) -> std::result::Result<String, ReasoningUnavailable> {
        let call = self.client.generate_with_system(REASONING_SYSTEM_PROMPT, summary);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(Ok(_)) => Err(ReasoningUnavailable("model returned an empty answer".to_string())),
            Ok(Err(e)) => Err(ReasoningUnavailable(e.to_string())),
            Err(_) => Err(ReasoningUnavailable(format!(
                "no answer within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResearchError, Result};

    struct CannedClient {
        reply: Option<&'static str>,
        delay: Duration,
    }

    #[async_trait]
    impl LLMClient for CannedClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.generate_with_system("", prompt).await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.reply
                .map(str::to_string)
                .ok_or_else(|| ResearchError::LLM("offline".to_string()))
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn reasoner(reply: Option<&'static str>, delay: Duration) -> LlmReasoner {
        LlmReasoner::new(Box::new(CannedClient { reply, delay }), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_elaborate_trims_reply() {
        let text = reasoner(Some("  Scizor is strong.\n"), Duration::ZERO)
            .elaborate("findings")
            .await
            .unwrap();
        assert_eq!(text, "Scizor is strong.");
    }

    #[tokio::test]
    async fn test_client_error_is_unavailable() {
        let err = reasoner(None, Duration::ZERO).elaborate("findings").await.unwrap_err();
        assert!(err.0.contains("offline"));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let err = reasoner(Some("late"), Duration::from_secs(5))
            .elaborate("findings")
            .await
            .unwrap_err();
        assert!(err.0.contains("no answer"));
    }

    #[tokio::test]
    async fn test_blank_reply_is_unavailable() {
        assert!(reasoner(Some("   "), Duration::ZERO).elaborate("x").await.is_err());
    }
}
