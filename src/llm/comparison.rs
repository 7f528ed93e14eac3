use crate::llm::client::LLMClient;
use crate::types::Result;

const COMPARISON_SYSTEM_PROMPT: &str =
    "You are a helpful Pokemon expert. Provide a concise but informative answer.";

/// Plain chat-model answer shown next to the researched report
pub struct ComparisonClient {
    client: Box<dyn LLMClient>,
}

impl ComparisonClient {
    pub fn new(client: Box<dyn LLMClient>) -> Self {
        Self { client }
    }

    /// Answer the raw question with no research context
    pub async fn answer(&self, query: &str) -> Result<String> {
        tracing::debug!(model = self.client.model_name(), "Requesting comparison answer");
        self.client
            .generate_with_system(COMPARISON_SYSTEM_PROMPT, query)
            .await
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
