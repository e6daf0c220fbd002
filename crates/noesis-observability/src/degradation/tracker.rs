//! Records every degradation: component, failure, fallback, timestamp and
//! whether the component has recovered.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use noesis_core::models::DegradationEvent;
use serde::{Deserialize, Serialize};

use crate::tracing_setup::events;

const DEFAULT_CAPACITY: usize = 10_000;

/// Recovery status of a degradation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Active,
    Recovered,
}

/// A degradation event with its recovery status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Bounded history of degradation events; the oldest are dropped first.
#[derive(Debug, Clone)]
pub struct DegradationTracker {
    events: VecDeque<TrackedDegradation>,
    capacity: usize,
}

impl Default for DegradationTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, event: DegradationEvent) {
        events::degradation_triggered(&event.component, &event.failure, &event.fallback_used);
        self.events.push_back(TrackedDegradation {
            event,
            recovery_status: RecoveryStatus::Active,
            recovered_at: None,
        });
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }

    /// Mark every active degradation of `component` as recovered.
    /// Returns how many were marked.
    pub fn mark_recovered(&mut self, component: &str) -> usize {
        let now = Utc::now();
        let mut marked = 0;
        for tracked in self.events.iter_mut().filter(|t| {
            t.event.component == component && t.recovery_status == RecoveryStatus::Active
        }) {
            tracked.recovery_status = RecoveryStatus::Recovered;
            tracked.recovered_at = Some(now);
            marked += 1;
        }
        if marked > 0 {
            events::degradation_recovered(component);
        }
        marked
    }

    pub fn events(&self) -> impl Iterator<Item = &TrackedDegradation> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn active_degradations(&self) -> Vec<&TrackedDegradation> {
        self.events
            .iter()
            .filter(|t| t.recovery_status == RecoveryStatus::Active)
            .collect()
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.events.iter().any(|t| {
            t.event.component == component && t.recovery_status == RecoveryStatus::Active
        })
    }

    /// Events for `component` in the last `window_secs` seconds.
    pub fn count_recent(&self, component: &str, window_secs: i64) -> usize {
        let cutoff = Utc::now() - Duration::seconds(window_secs);
        self.events
            .iter()
            .filter(|t| t.event.component == component && t.event.timestamp > cutoff)
            .count()
    }

    /// How long `component` has been continuously degraded.
    pub fn degraded_duration(&self, component: &str) -> Option<Duration> {
        let earliest = self
            .events
            .iter()
            .filter(|t| {
                t.event.component == component && t.recovery_status == RecoveryStatus::Active
            })
            .map(|t| t.event.timestamp)
            .min()?;
        Some(Utc::now() - earliest)
    }
}
