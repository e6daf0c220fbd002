use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::StateSnapshot;
use crate::config::defaults;

/// One independent retrieval algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Semantic,
    Keyword,
    Hybrid,
    ConsciousnessPattern,
    CrossReference,
    Reasoning,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Self::Semantic,
        Self::Keyword,
        Self::Hybrid,
        Self::ConsciousnessPattern,
        Self::CrossReference,
        Self::Reasoning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Keyword => "keyword",
            Self::Hybrid => "hybrid",
            Self::ConsciousnessPattern => "consciousness_pattern",
            Self::CrossReference => "cross_reference",
            Self::Reasoning => "reasoning",
        }
    }

    /// Whether the strategy cannot produce anything without the embedding provider.
    pub fn requires_embedding(&self) -> bool {
        !matches!(self, Self::Keyword | Self::Hybrid)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The requesting user and their per-domain skill levels in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub skills: BTreeMap<String, f64>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            skills: BTreeMap::new(),
        }
    }

    pub fn with_skill(mut self, domain: impl Into<String>, level: f64) -> Self {
        self.skills.insert(domain.into(), level.clamp(0.0, 1.0));
        self
    }

    pub fn mean_skill(&self) -> Option<f64> {
        if self.skills.is_empty() {
            None
        } else {
            Some(self.skills.values().sum::<f64>() / self.skills.len() as f64)
        }
    }
}

/// Per-request context. Constructed at query time and never persisted.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub query: String,
    /// Query rewritten with state context, if enhancement ran.
    pub enhanced_query: Option<String>,
    pub snapshot: StateSnapshot,
    pub user: Option<UserContext>,
    /// Open session this query belongs to, if any.
    pub session_id: Option<String>,
    /// Ordered by priority. Duplicates are kept and weigh the budget split.
    pub strategies: Vec<Strategy>,
    /// Optional per-strategy budget weights.
    pub strategy_weights: Option<BTreeMap<Strategy, f64>>,
    pub max_results: usize,
    /// Minimum relevance factor a candidate needs to be ranked at all.
    pub min_relevance: f64,
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl QueryContext {
    pub fn new(query: impl Into<String>, snapshot: StateSnapshot) -> Self {
        Self {
            query: query.into(),
            enhanced_query: None,
            snapshot,
            user: None,
            session_id: None,
            strategies: Vec::new(),
            strategy_weights: None,
            max_results: defaults::DEFAULT_MAX_RESULTS,
            min_relevance: defaults::DEFAULT_MIN_RELEVANCE,
            timeout: Duration::from_millis(defaults::DEFAULT_TIMEOUT_MS),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_user(mut self, user: UserContext) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_strategy_weights(mut self, weights: BTreeMap<Strategy, f64>) -> Self {
        self.strategy_weights = Some(weights);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Text used for retrieval: the enhanced query when present.
    pub fn effective_query(&self) -> &str {
        self.enhanced_query.as_deref().unwrap_or(&self.query)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.user_id.as_str())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
