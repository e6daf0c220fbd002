use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Full embedding dimensions shared by fragments and episodes.
    pub dimensions: usize,
    /// Trailing dimensions the built-in provider reserves for state features.
    pub state_dimensions: usize,
    /// L1 in-memory cache max entries.
    pub l1_cache_size: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
            state_dimensions: defaults::DEFAULT_STATE_DIMENSIONS,
            l1_cache_size: defaults::DEFAULT_L1_CACHE_SIZE,
        }
    }
}
