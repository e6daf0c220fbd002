use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApplicabilityWindow, FragmentKind, Signals};
use crate::constants::FRAGMENT_SCHEMA_VERSION;
use crate::similarity;
use crate::text;

/// A retrievable unit of knowledge.
///
/// The knowledge store is the only owner of fragment identity and content;
/// the vector index refers to fragments by `id` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeFragment {
    pub schema_version: u16,
    /// Stable identifier.
    pub id: String,
    /// Short human label. Empty titles fall back to the first sentence.
    pub title: String,
    pub content: String,
    /// Embedding of `content`, owned by the fragment.
    pub embedding: Vec<f32>,
    /// Model that produced `embedding`.
    pub embedding_model: String,
    /// Kind and its per-kind metadata.
    pub kind: FragmentKind,
    pub window: ApplicabilityWindow,
    /// Population id → affinity weight in [0, 1].
    pub population_affinity: BTreeMap<String, f64>,
    pub signals: Signals,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    /// Time the last recency decay pass touched this fragment.
    pub last_decayed: Option<DateTime<Utc>>,
    /// Rolling feedback scores, oldest first.
    pub feedback_scores: VecDeque<f64>,
    pub tags: Vec<String>,
    pub domain: String,
    /// Retired fragments stay stored but are never retrieved.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeFragment {
    /// Create a fragment with default signals and an unrestricted window.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        kind: FragmentKind,
        embedding: Vec<f32>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            schema_version: FRAGMENT_SCHEMA_VERSION,
            id: id.into(),
            title: String::new(),
            content: content.into(),
            embedding,
            embedding_model: embedding_model.into(),
            kind,
            window: ApplicabilityWindow::unrestricted(),
            population_affinity: BTreeMap::new(),
            signals: Signals::default(),
            access_count: 0,
            last_accessed: now,
            last_decayed: None,
            feedback_scores: VecDeque::new(),
            tags: Vec::new(),
            domain: String::new(),
            active: true,
            created_at: now,
        }
    }

    /// Title, or the first sentence of the content when no title was given.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            text::first_sentence(&self.content, 120)
        } else {
            self.title.clone()
        }
    }

    /// Text fed to the embedding provider.
    pub fn embedding_text(&self) -> String {
        if self.title.trim().is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.title, self.content)
        }
    }

    /// Validate every invariant that does not depend on the active provider.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".into());
        }
        if self.content.trim().is_empty() {
            return Err("content is empty".into());
        }
        if self.schema_version != FRAGMENT_SCHEMA_VERSION {
            return Err(format!(
                "schema version {} unsupported (expected {})",
                self.schema_version, FRAGMENT_SCHEMA_VERSION
            ));
        }
        if self.embedding.is_empty() {
            return Err("embedding is empty".into());
        }
        if !similarity::is_finite(&self.embedding) {
            return Err("embedding contains non-finite values".into());
        }
        self.kind.validate()?;
        self.window.validate()?;
        self.signals.validate()?;
        for (population, weight) in &self.population_affinity {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(format!("affinity {weight} for {population} outside [0, 1]"));
            }
        }
        for score in &self.feedback_scores {
            if !score.is_finite() || !(0.0..=1.0).contains(score) {
                return Err(format!("feedback score {score} outside [0, 1]"));
            }
        }
        Ok(())
    }

    /// Push a feedback score, evicting the oldest beyond `capacity`.
    pub fn push_feedback(&mut self, score: f64, capacity: usize) {
        self.feedback_scores.push_back(score.clamp(0.0, 1.0));
        while self.feedback_scores.len() > capacity {
            self.feedback_scores.pop_front();
        }
    }

    /// Mean of the rolling feedback scores, if any.
    pub fn mean_feedback(&self) -> Option<f64> {
        if self.feedback_scores.is_empty() {
            None
        } else {
            Some(self.feedback_scores.iter().sum::<f64>() / self.feedback_scores.len() as f64)
        }
    }

    /// Whether the fragment shares a tag or its domain with `other`.
    pub fn is_related_to(&self, other: &KnowledgeFragment) -> bool {
        if self.id == other.id {
            return false;
        }
        (!self.domain.is_empty() && self.domain == other.domain)
            || self.tags.iter().any(|t| other.tags.contains(t))
    }
}
