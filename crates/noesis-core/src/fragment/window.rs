use serde::{Deserialize, Serialize};

/// Consciousness applicability window of a fragment.
///
/// The fragment needs at least `min_level` to be useful and is most useful
/// while the state-level sits inside `[optimal_low, optimal_high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicabilityWindow {
    pub min_level: f64,
    pub optimal_low: f64,
    pub optimal_high: f64,
}

impl ApplicabilityWindow {
    pub fn new(min_level: f64, optimal_low: f64, optimal_high: f64) -> Self {
        Self {
            min_level,
            optimal_low,
            optimal_high,
        }
    }

    /// Window accepting every state-level.
    pub fn unrestricted() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("min_level", self.min_level),
            ("optimal_low", self.optimal_low),
            ("optimal_high", self.optimal_high),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} {v} outside [0, 1]"));
            }
        }
        if self.optimal_low > self.optimal_high {
            return Err(format!(
                "optimal range [{}, {}] is inverted",
                self.optimal_low, self.optimal_high
            ));
        }
        if self.min_level > self.optimal_high {
            return Err(format!(
                "min_level {} above optimal_high {}",
                self.min_level, self.optimal_high
            ));
        }
        Ok(())
    }

    pub fn contains(&self, level: f64) -> bool {
        level >= self.optimal_low && level <= self.optimal_high
    }

    /// Distance from `level` to the nearest optimal boundary; 0 inside.
    pub fn distance(&self, level: f64) -> f64 {
        if level < self.optimal_low {
            self.optimal_low - level
        } else if level > self.optimal_high {
            level - self.optimal_high
        } else {
            0.0
        }
    }

    pub fn meets_minimum(&self, level: f64) -> bool {
        level >= self.min_level
    }
}

impl Default for ApplicabilityWindow {
    fn default() -> Self {
        Self::unrestricted()
    }
}
