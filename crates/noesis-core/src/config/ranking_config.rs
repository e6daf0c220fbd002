use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::{NoesisError, NoesisResult};

/// Weights for the six ranking factors. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub relevance: f64,
    pub state_alignment: f64,
    pub user_context: f64,
    pub quality: f64,
    pub recency: f64,
    pub authority: f64,
}

impl RankingWeights {
    /// Build a weight vector, rejecting anything that is not already normalized.
    pub fn new(
        relevance: f64,
        state_alignment: f64,
        user_context: f64,
        quality: f64,
        recency: f64,
        authority: f64,
    ) -> NoesisResult<Self> {
        let weights = Self {
            relevance,
            state_alignment,
            user_context,
            quality,
            recency,
            authority,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.relevance,
            self.state_alignment,
            self.user_context,
            self.quality,
            self.recency,
            self.authority,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weights are never normalized on the caller's behalf.
    pub fn validate(&self) -> NoesisResult<()> {
        if let Some(bad) = self
            .as_array()
            .iter()
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(NoesisError::InvalidWeights {
                reason: format!("weight {bad} is negative or not finite"),
            });
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > defaults::WEIGHT_SUM_EPSILON {
            return Err(NoesisError::InvalidWeights {
                reason: format!("weights sum to {sum:.9}, expected 1.0"),
            });
        }
        Ok(())
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            relevance: defaults::DEFAULT_WEIGHT_RELEVANCE,
            state_alignment: defaults::DEFAULT_WEIGHT_STATE_ALIGNMENT,
            user_context: defaults::DEFAULT_WEIGHT_USER_CONTEXT,
            quality: defaults::DEFAULT_WEIGHT_QUALITY,
            recency: defaults::DEFAULT_WEIGHT_RECENCY,
            authority: defaults::DEFAULT_WEIGHT_AUTHORITY,
        }
    }
}

/// Ranking function configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    /// Falloff width outside the optimal range, as a fraction of that
    /// range's own width (not of the 0..1 level scale). State-alignment
    /// reaches 0 at `state_tolerance * (optimal_high - optimal_low)` past
    /// the nearest boundary, so narrow windows fall off faster.
    pub state_tolerance: f64,
    /// Score used for a factor that cannot be computed.
    pub neutral_score: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            state_tolerance: defaults::DEFAULT_STATE_TOLERANCE,
            neutral_score: defaults::DEFAULT_NEUTRAL_SCORE,
        }
    }
}
