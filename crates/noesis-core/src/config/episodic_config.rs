use serde::{Deserialize, Serialize};

use super::defaults;

/// Fragment recency decay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Recency halves every this many hours without access.
    pub recency_half_life_hours: f64,
    /// Interval the external scheduler should use between passes (seconds).
    pub processing_interval_secs: u64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            recency_half_life_hours: defaults::DEFAULT_RECENCY_HALF_LIFE_HOURS,
            processing_interval_secs: defaults::DEFAULT_DECAY_PROCESSING_INTERVAL_SECS,
        }
    }
}

/// Episodic memory and consolidation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodicConfig {
    /// Minimum embedding similarity for two episodes to be merged.
    pub consolidation_similarity: f64,
    /// Maximum gap between two episodes' time windows (hours).
    pub consolidation_proximity_hours: f64,
    /// Importance bonus granted to a successor for corroboration.
    pub corroboration_bonus: f64,
    /// Episodes whose importance decays below this are retired.
    pub retention_threshold: f64,
    pub importance_half_life_days: f64,
    /// Interactions of an open session folded into the pattern query.
    pub recent_interactions: usize,
}

impl Default for EpisodicConfig {
    fn default() -> Self {
        Self {
            consolidation_similarity: defaults::DEFAULT_CONSOLIDATION_SIMILARITY,
            consolidation_proximity_hours: defaults::DEFAULT_CONSOLIDATION_PROXIMITY_HOURS,
            corroboration_bonus: defaults::DEFAULT_CORROBORATION_BONUS,
            retention_threshold: defaults::DEFAULT_RETENTION_THRESHOLD,
            importance_half_life_days: defaults::DEFAULT_IMPORTANCE_HALF_LIFE_DAYS,
            recent_interactions: defaults::DEFAULT_RECENT_INTERACTIONS,
        }
    }
}
