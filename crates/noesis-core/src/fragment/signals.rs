use serde::{Deserialize, Serialize};

/// Per-fragment ranking signals, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signals {
    pub quality: f64,
    pub authority: f64,
    pub recency: f64,
    pub complexity: f64,
}

impl Signals {
    pub fn new(quality: f64, authority: f64, recency: f64, complexity: f64) -> Self {
        Self {
            quality,
            authority,
            recency,
            complexity,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("quality", self.quality),
            ("authority", self.authority),
            ("recency", self.recency),
            ("complexity", self.complexity),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} score {v} outside [0, 1]"));
            }
        }
        Ok(())
    }

    /// Apply an additive delta, clamping each touched signal to [0, 1].
    pub fn apply(&mut self, delta: &SignalDelta) {
        self.quality = (self.quality + delta.quality).clamp(0.0, 1.0);
        self.recency = (self.recency + delta.recency).clamp(0.0, 1.0);
        self.authority = (self.authority + delta.authority).clamp(0.0, 1.0);
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new(0.5, 0.5, 1.0, 0.5)
    }
}

/// Additive adjustment to the mutable signals of a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub quality: f64,
    pub recency: f64,
    pub authority: f64,
}

impl SignalDelta {
    pub fn new(quality: f64, recency: f64, authority: f64) -> Self {
        Self {
            quality,
            recency,
            authority,
        }
    }

    /// Clamp every component into `[-bound, bound]`; non-finite parts become 0.
    pub fn bounded(self, bound: f64) -> Self {
        let b = |v: f64| if v.is_finite() { v.clamp(-bound, bound) } else { 0.0 };
        Self {
            quality: b(self.quality),
            recency: b(self.recency),
            authority: b(self.authority),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.quality == 0.0 && self.recency == 0.0 && self.authority == 0.0
    }
}
