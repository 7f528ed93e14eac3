//! Shared test helpers.

#![allow(dead_code)]

pub mod mocks;

use pokedex::utils::toml_config::ResearchConfig;
use std::time::Duration;

/// Default configuration with a short budget and fast backoff
pub fn test_config(budget: Duration) -> ResearchConfig {
    let mut config = ResearchConfig::default();
    config.pipeline.budget_ms = budget.as_millis() as u64;
    config.pipeline.backoff_base_ms = 10;
    config.pipeline.reasoning_enabled = false;
    config
}
