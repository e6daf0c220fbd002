pub mod defaults;
mod embedding_config;
mod episodic_config;
mod feedback_config;
mod index_config;
mod observability_config;
mod ranking_config;
mod retrieval_config;

pub use embedding_config::EmbeddingConfig;
pub use episodic_config::{DecayConfig, EpisodicConfig};
pub use feedback_config::FeedbackConfig;
pub use index_config::IndexConfig;
pub use observability_config::ObservabilityConfig;
pub use ranking_config::{RankingConfig, RankingWeights};
pub use retrieval_config::RetrievalConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{NoesisError, NoesisResult};

/// Top-level configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoesisConfig {
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub ranking: RankingConfig,
    pub retrieval: RetrievalConfig,
    pub decay: DecayConfig,
    pub episodic: EpisodicConfig,
    pub feedback: FeedbackConfig,
    pub observability: ObservabilityConfig,
}

impl NoesisConfig {
    /// Parse a TOML document. Missing sections and fields fall back to defaults.
    pub fn from_toml(source: &str) -> NoesisResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| NoesisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> NoesisResult<()> {
        self.ranking.weights.validate()?;
        if self.embedding.dimensions == 0 {
            return Err(NoesisError::Config("embedding.dimensions must be > 0".into()));
        }
        if self.embedding.state_dimensions >= self.embedding.dimensions {
            return Err(NoesisError::Config(
                "embedding.state_dimensions must be smaller than embedding.dimensions".into(),
            ));
        }
        if !(self.ranking.state_tolerance > 0.0 && self.ranking.state_tolerance <= 1.0) {
            return Err(NoesisError::Config(
                "ranking.state_tolerance must be in (0, 1]".into(),
            ));
        }
        if self.decay.recency_half_life_hours <= 0.0 {
            return Err(NoesisError::Config(
                "decay.recency_half_life_hours must be > 0".into(),
            ));
        }
        if self.episodic.importance_half_life_days <= 0.0 {
            return Err(NoesisError::Config(
                "episodic.importance_half_life_days must be > 0".into(),
            ));
        }
        if self.index.documents_collection == self.index.episodes_collection {
            return Err(NoesisError::Config(
                "documents and episodes must use distinct collections".into(),
            ));
        }
        Ok(())
    }
}
