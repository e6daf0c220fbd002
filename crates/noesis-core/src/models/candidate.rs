use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::fragment::KnowledgeFragment;

/// Where the relevance factor of a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceSource {
    /// Cosine similarity against the query embedding.
    Embedding,
    /// Best strategy-local evidence (lexical, pattern, cross-reference).
    Evidence,
    /// Nothing computable; the neutral value was used.
    Neutral,
}

/// Per-factor scores, each in [0, 1], kept for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub relevance: f64,
    pub state_alignment: f64,
    pub user_context: f64,
    pub quality: f64,
    pub recency: f64,
    pub authority: f64,
}

impl ScoreBreakdown {
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
}

/// A fragment with its explainable score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub fragment: KnowledgeFragment,
    pub breakdown: ScoreBreakdown,
    pub final_score: f64,
    pub relevance_source: RelevanceSource,
    /// Strategies that surfaced this fragment.
    pub strategies: BTreeSet<Strategy>,
}

impl RankedCandidate {
    pub fn id(&self) -> &str {
        &self.fragment.id
    }
}
