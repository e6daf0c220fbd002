use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time read of the consciousness state, passed by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Monotonically increasing version assigned by the transport.
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    /// Consciousness level in [0, 1].
    pub level: f64,
    /// Magnitude of the most recent change.
    pub change_magnitude: f64,
    pub adaptation_rate: f64,
    /// Population id → current fitness/activity in [0, 1].
    pub population_activity: BTreeMap<String, f64>,
}

impl StateSnapshot {
    pub fn new(version: u64, level: f64) -> Self {
        Self {
            version,
            captured_at: Utc::now(),
            level: level.clamp(0.0, 1.0),
            change_magnitude: 0.0,
            adaptation_rate: 0.0,
            population_activity: BTreeMap::new(),
        }
    }

    pub fn with_population(mut self, population: impl Into<String>, activity: f64) -> Self {
        self.population_activity
            .insert(population.into(), activity.clamp(0.0, 1.0));
        self
    }

    pub fn with_dynamics(mut self, change_magnitude: f64, adaptation_rate: f64) -> Self {
        self.change_magnitude = change_magnitude;
        self.adaptation_rate = adaptation_rate;
        self
    }

    pub fn mean_activity(&self) -> f64 {
        if self.population_activity.is_empty() {
            0.0
        } else {
            self.population_activity.values().sum::<f64>() / self.population_activity.len() as f64
        }
    }

    /// Compact numeric features used by state-aware embedding providers.
    pub fn features(&self) -> [f32; 4] {
        [
            self.level as f32,
            self.change_magnitude.clamp(0.0, 1.0) as f32,
            self.adaptation_rate.clamp(0.0, 1.0) as f32,
            self.mean_activity() as f32,
        ]
    }

    /// Short textual rendering used to enhance queries.
    pub fn describe(&self) -> String {
        let band = match self.level {
            l if l < 0.25 => "low",
            l if l < 0.5 => "moderate",
            l if l < 0.75 => "elevated",
            _ => "high",
        };
        let dominant = self
            .population_activity
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(p, _)| p.as_str());
        match dominant {
            Some(p) => format!("{band} awareness, dominant population {p}"),
            None => format!("{band} awareness"),
        }
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::new(0, 0.5)
    }
}
