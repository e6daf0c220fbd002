//! Feature-hashing provider.
//!
//! Terms are hashed (FNV-1a) into the leading `dimensions - state_dimensions`
//! buckets and weighted by term frequency. The trailing `state_dimensions`
//! slots carry the snapshot features when a state is supplied and stay zero
//! otherwise. The whole vector is L2-normalized.

use std::collections::BTreeMap;

use noesis_core::errors::NoesisResult;
use noesis_core::models::StateSnapshot;
use noesis_core::similarity;
use noesis_core::text;
use noesis_core::traits::IEmbeddingProvider;

/// Relative weight of the state tail against the term buckets.
const STATE_WEIGHT: f32 = 0.25;

/// Deterministic, dependency-free embedding provider.
///
/// Not as semantically rich as a neural model, but always available, which
/// makes it the last link of every degradation chain.
pub struct HashingProvider {
    dimensions: usize,
    state_dimensions: usize,
    model_id: String,
}

impl HashingProvider {
    /// `state_dimensions` is clamped so at least one term bucket remains.
    pub fn new(dimensions: usize, state_dimensions: usize) -> Self {
        let state_dimensions = state_dimensions.min(dimensions.saturating_sub(1));
        Self {
            dimensions,
            state_dimensions,
            model_id: format!("hashing-v1-{dimensions}x{state_dimensions}"),
        }
    }

    fn term_buckets(&self) -> usize {
        self.dimensions - self.state_dimensions
    }

    /// Hash a term into a bucket index using FNV-1a.
    fn hash_term(term: &str, buckets: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % buckets as u64) as usize
    }

    fn vectorize(&self, input: &str, state: Option<&StateSnapshot>) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimensions];
        let buckets = self.term_buckets();

        let tokens = text::tokenize(input);
        if !tokens.is_empty() && buckets > 0 {
            // BTreeMap keeps accumulation order stable across runs.
            let mut tf: BTreeMap<&str, f32> = BTreeMap::new();
            for tok in &tokens {
                *tf.entry(tok.as_str()).or_default() += 1.0;
            }
            let total = tokens.len() as f32;
            for (term, count) in tf {
                let idf = 1.0 + (term.len() as f32).ln();
                vec[Self::hash_term(term, buckets)] += (count / total) * idf;
            }
            similarity::normalize(&mut vec[..buckets]);
        }

        if let Some(snapshot) = state {
            let features = snapshot.features();
            for (i, slot) in vec[buckets..].iter_mut().enumerate() {
                *slot = features[i % features.len()] * STATE_WEIGHT;
            }
        }

        similarity::normalize(&mut vec);
        vec
    }
}

impl IEmbeddingProvider for HashingProvider {
    fn embed(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        Ok(self.vectorize(text, state))
    }

    fn embed_batch(&self, texts: &[String]) -> NoesisResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t, None)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn supports_state_context(&self) -> bool {
        self.state_dimensions > 0
    }

    fn is_available(&self) -> bool {
        true
    }
}
