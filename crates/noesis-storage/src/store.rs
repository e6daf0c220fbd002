use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use noesis_core::config::FeedbackConfig;
use noesis_core::errors::{NoesisError, NoesisResult, StorageError};
use noesis_core::fragment::{KnowledgeFragment, SignalDelta, Signals};
use noesis_core::similarity;
use noesis_core::text;
use tracing::{debug, info, warn};

use crate::decay::{self, DecayReport};
use crate::lexical::LexicalIndex;

/// Embedding model every fragment must match to be eligible for similarity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveModel {
    pub model_id: String,
    pub dimensions: usize,
}

/// Fragment store keyed by stable id.
pub struct KnowledgeStore {
    fragments: DashMap<String, Arc<KnowledgeFragment>>,
    lexical: LexicalIndex,
    model: RwLock<ActiveModel>,
    feedback_history: usize,
    max_signal_delta: f64,
}

impl KnowledgeStore {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self::with_config(model_id, dimensions, &FeedbackConfig::default())
    }

    pub fn with_config(
        model_id: impl Into<String>,
        dimensions: usize,
        feedback: &FeedbackConfig,
    ) -> Self {
        Self {
            fragments: DashMap::new(),
            lexical: LexicalIndex::default(),
            model: RwLock::new(ActiveModel {
                model_id: model_id.into(),
                dimensions,
            }),
            feedback_history: feedback.history,
            max_signal_delta: feedback.max_signal_delta,
        }
    }

    pub fn active_model(&self) -> ActiveModel {
        match self.model.read() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn is_stale(&self, fragment: &KnowledgeFragment, model: &ActiveModel) -> bool {
        fragment.embedding_model != model.model_id || fragment.embedding.len() != model.dimensions
    }

    // ── Read path ──

    pub fn get(&self, id: &str) -> NoesisResult<Arc<KnowledgeFragment>> {
        self.fragments
            .get(id)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| NoesisError::not_found("fragment", id))
    }

    /// The fragment if it is active and its embedding matches the active model.
    pub fn eligible(&self, id: &str) -> Option<Arc<KnowledgeFragment>> {
        let model = self.active_model();
        self.fragments
            .get(id)
            .map(|f| Arc::clone(f.value()))
            .filter(|f| f.active && !self.is_stale(f, &model))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.contains_key(id)
    }

    /// All ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.fragments.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Keyword search over the inverted token index. Returns `(id, overlap)`
    /// for eligible fragments, best first, ties by id.
    pub fn lexical_search(&self, query: &str, k: usize) -> Vec<(String, f64)> {
        let terms = text::term_set(query);
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut hits: Vec<(String, f64)> = self
            .lexical
            .score(&terms)
            .into_iter()
            .filter(|(id, _)| self.eligible(id).is_some())
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(k);
        hits
    }

    /// Up to `fan_out` eligible fragments sharing a tag or the domain with `seed`.
    ///
    /// Ordered by shared tag count, then authority, then id.
    pub fn related(&self, seed: &KnowledgeFragment, fan_out: usize) -> Vec<Arc<KnowledgeFragment>> {
        if fan_out == 0 {
            return Vec::new();
        }
        let model = self.active_model();
        let mut related: Vec<(usize, Arc<KnowledgeFragment>)> = self
            .fragments
            .iter()
            .filter(|e| e.value().active && !self.is_stale(e.value(), &model))
            .filter(|e| seed.is_related_to(e.value()))
            .map(|e| {
                let f = Arc::clone(e.value());
                let shared = f.tags.iter().filter(|t| seed.tags.contains(t)).count();
                (shared, f)
            })
            .collect();
        related.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| {
                    b.signals
                        .authority
                        .partial_cmp(&a.signals.authority)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        related.into_iter().take(fan_out).map(|(_, f)| f).collect()
    }

    // ── Write path ──

    /// Validate and insert or replace a fragment.
    pub fn put(&self, fragment: KnowledgeFragment) -> NoesisResult<Arc<KnowledgeFragment>> {
        fragment
            .validate()
            .map_err(|reason| NoesisError::invalid_fragment(&fragment.id, reason))?;
        let model = self.active_model();
        if fragment.embedding.len() != model.dimensions {
            return Err(NoesisError::invalid_fragment(
                &fragment.id,
                format!(
                    "embedding has {} dimensions, active model {} expects {}",
                    fragment.embedding.len(),
                    model.model_id,
                    model.dimensions
                ),
            ));
        }
        if fragment.embedding_model != model.model_id {
            return Err(NoesisError::invalid_fragment(
                &fragment.id,
                format!(
                    "embedding model {} does not match active model {}",
                    fragment.embedding_model, model.model_id
                ),
            ));
        }

        let fragment = Arc::new(fragment);
        self.lexical.insert(&fragment.id, &fragment.embedding_text());
        self.fragments
            .insert(fragment.id.clone(), Arc::clone(&fragment));
        debug!(id = %fragment.id, kind = fragment.kind.label(), "fragment stored");
        Ok(fragment)
    }

    /// Copy-on-write mutation of one fragment.
    fn update<F>(&self, id: &str, mutate: F) -> NoesisResult<Arc<KnowledgeFragment>>
    where
        F: FnOnce(&mut KnowledgeFragment) -> NoesisResult<()>,
    {
        let mut entry = self
            .fragments
            .get_mut(id)
            .ok_or_else(|| NoesisError::not_found("fragment", id))?;
        let mut next = KnowledgeFragment::clone(entry.value());
        mutate(&mut next)?;
        let next = Arc::new(next);
        *entry.value_mut() = Arc::clone(&next);
        Ok(next)
    }

    /// Apply a bounded additive adjustment to quality, recency and authority.
    ///
    /// Each component must be finite with magnitude at most the configured
    /// bound; the resulting signals are clamped to [0, 1].
    pub fn update_signals(&self, id: &str, delta: SignalDelta) -> NoesisResult<Signals> {
        for (signal, value) in [
            ("quality", delta.quality),
            ("recency", delta.recency),
            ("authority", delta.authority),
        ] {
            if !value.is_finite() || value.abs() > self.max_signal_delta {
                return Err(StorageError::DeltaOutOfBounds {
                    signal,
                    value,
                    bound: self.max_signal_delta,
                }
                .into());
            }
        }
        let updated = self.update(id, |f| {
            f.signals.apply(&delta);
            Ok(())
        })?;
        debug!(
            id,
            quality = updated.signals.quality,
            authority = updated.signals.authority,
            "signals updated"
        );
        Ok(updated.signals)
    }

    /// Count an access. `last_accessed` never moves backwards.
    pub fn record_access(&self, id: &str, at: DateTime<Utc>) -> NoesisResult<()> {
        self.update(id, |f| {
            f.access_count = f.access_count.saturating_add(1);
            if at > f.last_accessed {
                f.last_accessed = at;
            }
            Ok(())
        })
        .map(|_| ())
    }

    /// Append a feedback score in [0, 1] to the rolling history.
    pub fn record_feedback(&self, id: &str, score: f64) -> NoesisResult<()> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(NoesisError::invalid_fragment(
                id,
                format!("feedback score {score} outside [0, 1]"),
            ));
        }
        let history = self.feedback_history;
        self.update(id, |f| {
            f.push_feedback(score, history);
            Ok(())
        })
        .map(|_| ())
    }

    /// Flag a fragment inactive. Retired fragments are kept but never retrieved.
    pub fn retire(&self, id: &str) -> NoesisResult<()> {
        self.update(id, |f| {
            f.active = false;
            Ok(())
        })?;
        info!(id, "fragment retired");
        Ok(())
    }

    // ── Decay ──

    /// Decay the recency of every fragment up to `now`, one at a time.
    pub fn decay(&self, now: DateTime<Utc>, half_life_hours: f64) -> DecayReport {
        let mut report = DecayReport::default();
        for id in self.ids() {
            report.processed += 1;
            let mut changed = false;
            let result = self.update(&id, |f| {
                let since = match f.last_decayed {
                    Some(d) if d > f.last_accessed => d,
                    _ => f.last_accessed,
                };
                if now <= since {
                    return Ok(());
                }
                let next = decay::decayed_recency(f.signals.recency, since, now, half_life_hours);
                if !next.is_finite() {
                    return Err(NoesisError::invalid_fragment(
                        &f.id,
                        "recency decay produced a non-finite value",
                    ));
                }
                changed = next < f.signals.recency;
                f.signals.recency = next.min(f.signals.recency);
                f.last_decayed = Some(now);
                Ok(())
            });
            match result {
                Ok(_) => {
                    if changed {
                        report.decayed += 1;
                    }
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "decay skipped fragment");
                    report.skipped.push(id);
                }
            }
        }
        info!(
            processed = report.processed,
            decayed = report.decayed,
            skipped = report.skipped.len(),
            "recency decay pass complete"
        );
        report
    }

    // ── Embedding migration ──

    /// Switch the active model. Every fragment produced by another model (or
    /// with other dimensions) becomes stale. Returns the number of stale fragments.
    pub fn mark_model(&self, model_id: impl Into<String>, dimensions: usize) -> usize {
        let next = ActiveModel {
            model_id: model_id.into(),
            dimensions,
        };
        match self.model.write() {
            Ok(mut m) => *m = next.clone(),
            Err(poisoned) => *poisoned.into_inner() = next.clone(),
        }
        let stale = self.stale_ids().len();
        info!(model = %next.model_id, dimensions, stale, "active embedding model changed");
        stale
    }

    /// Active fragments whose embedding does not match the active model, sorted.
    pub fn stale_ids(&self) -> Vec<String> {
        let model = self.active_model();
        let mut ids: Vec<String> = self
            .fragments
            .iter()
            .filter(|e| e.value().active && self.is_stale(e.value(), &model))
            .map(|e| e.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Replace a fragment's embedding with one from the active model.
    pub fn replace_embedding(
        &self,
        id: &str,
        embedding: Vec<f32>,
        model_id: &str,
    ) -> NoesisResult<()> {
        let model = self.active_model();
        if model_id != model.model_id {
            return Err(StorageError::StaleEmbedding {
                id: id.to_string(),
                model: model_id.to_string(),
            }
            .into());
        }
        if embedding.len() != model.dimensions {
            return Err(NoesisError::DimensionMismatch {
                expected: model.dimensions,
                actual: embedding.len(),
            });
        }
        if !similarity::is_finite(&embedding) {
            return Err(NoesisError::invalid_fragment(id, "embedding contains non-finite values"));
        }
        self.update(id, |f| {
            if !f.active {
                return Err(StorageError::Retired { id: f.id.clone() }.into());
            }
            f.embedding = embedding;
            f.embedding_model = model_id.to_string();
            Ok(())
        })
        .map(|_| ())
    }
}
