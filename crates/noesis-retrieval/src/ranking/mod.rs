//! Ranker: score → relevance threshold → deterministic sort → truncate.

pub mod scorer;

use std::cmp::Ordering;

use noesis_core::config::{RankingConfig, RankingWeights};
use noesis_core::errors::NoesisResult;
use noesis_core::models::{QueryContext, RankedCandidate};
use tracing::debug;

use crate::search::Candidate;

/// Pure, single-threaded ranking function.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: RankingWeights,
    tolerance: f64,
    neutral: f64,
}

impl Ranker {
    /// Rejects weights that are not already normalized.
    pub fn new(config: &RankingConfig) -> NoesisResult<Self> {
        config.weights.validate()?;
        Ok(Self {
            weights: config.weights,
            tolerance: config.state_tolerance,
            neutral: config.neutral_score,
        })
    }

    pub fn with_weights(mut self, weights: RankingWeights) -> NoesisResult<Self> {
        weights.validate()?;
        self.weights = weights;
        Ok(self)
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Score, filter by `query.min_relevance`, and order candidates.
    ///
    /// Order: final score descending, then authority descending, then id
    /// ascending. At most `query.max_results` are returned.
    pub fn rank(
        &self,
        candidates: &[Candidate],
        query: &QueryContext,
        query_embedding: Option<&[f32]>,
    ) -> Vec<RankedCandidate> {
        let mut scored: Vec<_> = candidates
            .iter()
            .map(|c| {
                let (breakdown, total, source) = scorer::score(
                    c,
                    &query.snapshot,
                    query.user.as_ref(),
                    query_embedding,
                    &self.weights,
                    self.tolerance,
                    self.neutral,
                );
                (c, breakdown, total, source)
            })
            .filter(|(_, breakdown, _, _)| breakdown.relevance >= query.min_relevance)
            .collect();

        let considered = scored.len();
        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.1.authority
                        .partial_cmp(&a.1.authority)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.0.id().cmp(b.0.id()))
        });
        scored.truncate(query.max_results);

        debug!(
            candidates = candidates.len(),
            considered,
            returned = scored.len(),
            "ranked candidates"
        );

        scored
            .into_iter()
            .map(|(c, breakdown, final_score, relevance_source)| RankedCandidate {
                fragment: (*c.fragment).clone(),
                breakdown,
                final_score,
                relevance_source,
                strategies: c.strategies(),
            })
            .collect()
    }
}
