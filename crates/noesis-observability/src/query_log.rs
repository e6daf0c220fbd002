//! Query performance log: query text, strategies, latency, result count,
//! degradation.

use std::collections::VecDeque;
use std::time::Duration;

use noesis_core::models::{ResultBundle, Strategy};
use serde::{Deserialize, Serialize};

/// A single query log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: String,
    pub query: String,
    pub strategies: Vec<Strategy>,
    pub latency: Duration,
    pub result_count: usize,
    pub degraded: bool,
    pub timestamp_epoch_ms: i64,
}

impl QueryLogEntry {
    /// Summarize a returned bundle, timestamped now.
    pub fn from_bundle(bundle: &ResultBundle) -> Self {
        Self {
            query_id: bundle.query_id.clone(),
            query: bundle.query.clone(),
            strategies: bundle.reports.iter().map(|r| r.strategy).collect(),
            latency: Duration::from_millis(bundle.elapsed_ms),
            result_count: bundle.items.len(),
            degraded: bundle.degraded,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Ring buffer of recent queries.
#[derive(Debug, Clone)]
pub struct QueryLog {
    entries: VecDeque<QueryLogEntry>,
    max_entries: usize,
}

impl QueryLog {
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn record(&mut self, entry: QueryLogEntry) {
        tracing::debug!(
            event = "query_logged",
            query_id = %entry.query_id,
            latency_ms = u64::try_from(entry.latency.as_millis()).unwrap_or(u64::MAX),
            result_count = entry.result_count,
            degraded = entry.degraded,
            "query logged"
        );
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &QueryLogEntry> {
        self.entries.iter()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / self.entries.len() as u32
    }

    /// Latency at percentile `p` in [0, 1], nearest rank.
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let last = latencies.len() - 1;
        let idx = ((p.clamp(0.0, 1.0) * last as f64).round() as usize).min(last);
        latencies[idx]
    }

    /// Share of logged queries that returned a degraded bundle.
    pub fn degraded_ratio(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().filter(|e| e.degraded).count() as f64 / self.entries.len() as f64
    }
}
