use serde::{Deserialize, Serialize};

use super::{RankedCandidate, Strategy};

/// How a strategy ended for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyStatus {
    Completed,
    TimedOut,
    Failed { reason: String },
    Cancelled,
}

impl StrategyStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Per-strategy annotation attached to every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub status: StrategyStatus,
    /// Candidates the strategy contributed, partial results included.
    pub candidates: usize,
    pub budget_ms: u64,
    pub elapsed_ms: u64,
    /// Keyword results stood in for a strategy that lost the embedding
    /// provider, or for a request where no strategy completed.
    pub fallback: bool,
}

/// Well-formed, possibly empty, response returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultBundle {
    pub query_id: String,
    pub query: String,
    pub enhanced_query: String,
    pub snapshot_version: u64,
    pub items: Vec<RankedCandidate>,
    pub reports: Vec<StrategyReport>,
    /// Set when any requested strategy failed or timed out, or the provider was lost.
    pub degraded: bool,
    pub elapsed_ms: u64,
}

impl ResultBundle {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.id()).collect()
    }

    pub fn report(&self, strategy: Strategy) -> Option<&StrategyReport> {
        self.reports.iter().find(|r| r.strategy == strategy)
    }
}
