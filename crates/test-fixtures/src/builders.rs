use chrono::{DateTime, Duration, Utc};
use noesis_core::fragment::{ApplicabilityWindow, FragmentKind, KnowledgeFragment};
use noesis_core::models::{Episode, EpisodeState, StateSnapshot, TrajectorySample, UserContext};
use noesis_core::traits::IEmbeddingProvider;

/// Chainable fragment builder. Defaults to a `domain_content` fragment.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    fragment: KnowledgeFragment,
}

impl FragmentBuilder {
    pub fn new(id: &str, content: &str) -> Self {
        let kind = FragmentKind::DomainContent {
            source: "fixtures".to_string(),
        };
        Self {
            fragment: KnowledgeFragment::new(id, content, kind, Vec::new(), ""),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.fragment.title = title.to_string();
        self
    }

    pub fn kind(mut self, kind: FragmentKind) -> Self {
        self.fragment.kind = kind;
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.fragment.domain = domain.to_string();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.fragment.tags.push(tag.to_string());
        self
    }

    pub fn window(mut self, min_level: f64, low: f64, high: f64) -> Self {
        self.fragment.window = ApplicabilityWindow::new(min_level, low, high);
        self
    }

    pub fn affinity(mut self, population: &str, weight: f64) -> Self {
        self.fragment
            .population_affinity
            .insert(population.to_string(), weight);
        self
    }

    pub fn quality(mut self, v: f64) -> Self {
        self.fragment.signals.quality = v;
        self
    }

    pub fn authority(mut self, v: f64) -> Self {
        self.fragment.signals.authority = v;
        self
    }

    pub fn recency(mut self, v: f64) -> Self {
        self.fragment.signals.recency = v;
        self
    }

    pub fn complexity(mut self, v: f64) -> Self {
        self.fragment.signals.complexity = v;
        self
    }

    pub fn last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.fragment.last_accessed = at;
        self
    }

    /// Finish with an explicit embedding and model id.
    pub fn embedding(mut self, embedding: Vec<f32>, model: &str) -> KnowledgeFragment {
        self.fragment.embedding = embedding;
        self.fragment.embedding_model = model.to_string();
        self.fragment
    }

    /// Finish by embedding the fragment text (title + content) with `provider`.
    pub fn embed_with(mut self, provider: &dyn IEmbeddingProvider) -> KnowledgeFragment {
        let text = self.fragment.embedding_text();
        self.fragment.embedding = provider
            .embed(&text, None)
            .unwrap_or_else(|e| panic!("fixture embed failed for {}: {e}", self.fragment.id));
        self.fragment.embedding_model = provider.model_id().to_string();
        self.fragment
    }
}

pub fn snapshot(version: u64, level: f64) -> StateSnapshot {
    StateSnapshot::new(version, level)
}

pub fn user(id: &str, skills: &[(&str, f64)]) -> UserContext {
    skills
        .iter()
        .fold(UserContext::new(id), |u, (domain, level)| u.with_skill(*domain, *level))
}

/// A closed episode spanning `start..start + minutes` with an evenly spaced trajectory.
pub fn episode(
    id: &str,
    user_id: &str,
    start: DateTime<Utc>,
    minutes: i64,
    levels: &[f64],
    accessed: &[&str],
    embedding: Vec<f32>,
) -> Episode {
    let mut ep = Episode::open(id, user_id, format!("session-{id}"), start);
    let step_secs = if levels.len() > 1 {
        (minutes * 60 / (levels.len() as i64 - 1)).max(1)
    } else {
        0
    };
    ep.trajectory = levels
        .iter()
        .enumerate()
        .map(|(i, level)| TrajectorySample {
            at: start + Duration::seconds(step_secs * i as i64),
            level: *level,
        })
        .collect();
    ep.ended_at = Some(start + Duration::minutes(minutes));
    ep.accessed_fragments = accessed.iter().map(|s| s.to_string()).collect();
    ep.embedding = embedding;
    ep.importance = 0.5;
    ep.state = EpisodeState::Closed;
    ep
}
