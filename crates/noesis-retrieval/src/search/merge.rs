//! Candidate merging: one entry per fragment id, evidence from every
//! strategy that surfaced it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use noesis_core::models::Strategy;
use noesis_core::KnowledgeFragment;

/// An unranked fragment with the evidence each strategy found for it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub fragment: Arc<KnowledgeFragment>,
    /// Best evidence per strategy, each in [0, 1].
    pub evidence: BTreeMap<Strategy, f64>,
}

impl Candidate {
    pub fn new(fragment: Arc<KnowledgeFragment>, strategy: Strategy, evidence: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(strategy, sanitize(evidence));
        Self {
            fragment,
            evidence: map,
        }
    }

    pub fn id(&self) -> &str {
        &self.fragment.id
    }

    pub fn strategies(&self) -> BTreeSet<Strategy> {
        self.evidence.keys().copied().collect()
    }

    /// Highest evidence any strategy recorded.
    pub fn best_evidence(&self) -> Option<f64> {
        self.evidence.values().copied().reduce(f64::max)
    }

    fn absorb(&mut self, other: Candidate) {
        for (strategy, value) in other.evidence {
            self.record(strategy, value);
        }
    }

    fn record(&mut self, strategy: Strategy, value: f64) {
        let value = sanitize(value);
        self.evidence
            .entry(strategy)
            .and_modify(|v| *v = v.max(value))
            .or_insert(value);
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Candidates keyed by fragment id. Iteration order is by id.
#[derive(Debug, Default)]
pub struct CandidatePool {
    by_id: BTreeMap<String, Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add evidence for `fragment`, keeping the superset of what is known.
    pub fn add(&mut self, fragment: Arc<KnowledgeFragment>, strategy: Strategy, evidence: f64) {
        match self.by_id.get_mut(&fragment.id) {
            Some(existing) => existing.record(strategy, evidence),
            None => {
                self.by_id.insert(
                    fragment.id.clone(),
                    Candidate::new(fragment, strategy, evidence),
                );
            }
        }
    }

    pub fn merge(&mut self, other: CandidatePool) {
        for (id, candidate) in other.by_id {
            match self.by_id.get_mut(&id) {
                Some(existing) => existing.absorb(candidate),
                None => {
                    self.by_id.insert(id, candidate);
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Keep candidates for which `refresh` returns the current fragment,
    /// swapping in that fragment.
    pub fn refresh<F>(&mut self, mut refresh: F)
    where
        F: FnMut(&str) -> Option<Arc<KnowledgeFragment>>,
    {
        self.by_id.retain(|id, candidate| match refresh(id) {
            Some(current) => {
                candidate.fragment = current;
                true
            }
            None => false,
        });
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.by_id.into_values().collect()
    }
}

/// Pool shared with a running strategy so whatever it found before a
/// timeout is still available.
#[derive(Debug, Clone, Default)]
pub struct CandidateSink {
    pool: Arc<Mutex<CandidatePool>>,
}

impl CandidateSink {
    pub fn add(&self, fragment: Arc<KnowledgeFragment>, strategy: Strategy, evidence: f64) {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(fragment, strategy, evidence);
    }

    pub fn len(&self) -> usize {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything collected so far, leaving the sink empty.
    pub fn take(&self) -> CandidatePool {
        std::mem::take(&mut *self.pool.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
