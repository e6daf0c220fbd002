use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::Strategy;

/// Retrieval subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Strategies used when a query names none.
    pub default_strategies: Vec<Strategy>,
    pub default_timeout_ms: u64,
    pub default_max_results: usize,
    pub default_min_relevance: f64,
    pub semantic_k: usize,
    pub keyword_k: usize,
    pub pattern_episodes_k: usize,
    pub cross_reference_seeds: usize,
    pub cross_reference_fan_out: usize,
    pub reasoning_seeds: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_strategies: vec![Strategy::Hybrid],
            default_timeout_ms: defaults::DEFAULT_TIMEOUT_MS,
            default_max_results: defaults::DEFAULT_MAX_RESULTS,
            default_min_relevance: defaults::DEFAULT_MIN_RELEVANCE,
            semantic_k: defaults::DEFAULT_SEMANTIC_K,
            keyword_k: defaults::DEFAULT_KEYWORD_K,
            pattern_episodes_k: defaults::DEFAULT_PATTERN_EPISODES_K,
            cross_reference_seeds: defaults::DEFAULT_CROSS_REFERENCE_SEEDS,
            cross_reference_fan_out: defaults::DEFAULT_CROSS_REFERENCE_FAN_OUT,
            reasoning_seeds: defaults::DEFAULT_REASONING_SEEDS,
        }
    }
}
