use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One (timestamp, state-level) sample of a session trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub at: DateTime<Utc>,
    pub level: f64,
}

/// Lifecycle of an episode.
///
/// `Open` → `Closed` → `Consolidated { successor }` | `Retired`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EpisodeState {
    Open,
    Closed,
    Consolidated { successor: String },
    Retired,
}

impl EpisodeState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Consolidated { .. } => "consolidated",
            Self::Retired => "retired",
        }
    }

    /// Only closed episodes are searchable, mergeable, and re-scorable.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted record of one interaction session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Strictly increasing in time.
    pub trajectory: Vec<TrajectorySample>,
    pub accessed_fragments: BTreeSet<String>,
    /// Interaction texts in order; folded into the summary embedding.
    pub interactions: Vec<String>,
    pub importance: f64,
    pub feedback_scores: Vec<f64>,
    /// Summary embedding of trajectory and interaction content.
    pub embedding: Vec<f32>,
    pub state: EpisodeState,
    /// Episodes merged into this one by consolidation.
    pub absorbed: Vec<String>,
}

impl Episode {
    pub fn open(
        id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            started_at,
            ended_at: None,
            trajectory: Vec::new(),
            accessed_fragments: BTreeSet::new(),
            interactions: Vec::new(),
            importance: 0.0,
            feedback_scores: Vec::new(),
            embedding: Vec::new(),
            state: EpisodeState::Open,
            absorbed: Vec::new(),
        }
    }

    /// Check the time-ordering invariants.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(end) = self.ended_at {
            if end < self.started_at {
                return Err(format!("ended at {end} before start {}", self.started_at));
            }
        }
        for pair in self.trajectory.windows(2) {
            if pair[1].at <= pair[0].at {
                return Err(format!(
                    "trajectory sample at {} does not follow {}",
                    pair[1].at, pair[0].at
                ));
            }
        }
        if let Some(sample) = self.trajectory.iter().find(|s| !(0.0..=1.0).contains(&s.level)) {
            return Err(format!("state-level {} outside [0, 1]", sample.level));
        }
        if !(0.0..=1.0).contains(&self.importance) {
            return Err(format!("importance {} outside [0, 1]", self.importance));
        }
        Ok(())
    }

    /// End of the time window; open episodes end at their last sample or start.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.ended_at
            .or_else(|| self.trajectory.last().map(|s| s.at))
            .unwrap_or(self.started_at)
    }

    /// Gap between two time windows; zero when they overlap.
    pub fn gap_to(&self, other: &Episode) -> Duration {
        let (a_start, a_end) = (self.started_at, self.window_end());
        let (b_start, b_end) = (other.started_at, other.window_end());
        if a_end < b_start {
            b_start - a_end
        } else if b_end < a_start {
            a_start - b_end
        } else {
            Duration::zero()
        }
    }

    /// Population variance of the trajectory's state-levels.
    pub fn level_variance(&self) -> f64 {
        let n = self.trajectory.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.trajectory.iter().map(|s| s.level).sum::<f64>() / n as f64;
        self.trajectory
            .iter()
            .map(|s| (s.level - mean).powi(2))
            .sum::<f64>()
            / n as f64
    }

    pub fn mean_level(&self) -> Option<f64> {
        if self.trajectory.is_empty() {
            None
        } else {
            Some(self.trajectory.iter().map(|s| s.level).sum::<f64>() / self.trajectory.len() as f64)
        }
    }

    pub fn mean_feedback(&self) -> Option<f64> {
        if self.feedback_scores.is_empty() {
            None
        } else {
            Some(self.feedback_scores.iter().sum::<f64>() / self.feedback_scores.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(start_h: i64, end_h: i64) -> Episode {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut e = Episode::open("e", "u", "s", base + Duration::hours(start_h));
        e.ended_at = Some(base + Duration::hours(end_h));
        e
    }

    #[test]
    fn overlapping_windows_have_zero_gap() {
        assert_eq!(episode(0, 4).gap_to(&episode(2, 6)), Duration::zero());
    }

    #[test]
    fn disjoint_windows_report_gap_both_ways() {
        let a = episode(0, 1);
        let b = episode(5, 6);
        assert_eq!(a.gap_to(&b), Duration::hours(4));
        assert_eq!(b.gap_to(&a), Duration::hours(4));
    }

    #[test]
    fn end_before_start_is_invalid() {
        assert!(episode(3, 1).validate().is_err());
    }

    #[test]
    fn non_increasing_trajectory_is_invalid() {
        let mut e = episode(0, 2);
        let t = e.started_at;
        e.trajectory.push(TrajectorySample { at: t, level: 0.2 });
        e.trajectory.push(TrajectorySample { at: t, level: 0.3 });
        assert!(e.validate().is_err());
    }

    #[test]
    fn variance_of_constant_trajectory_is_zero() {
        let mut e = episode(0, 2);
        for i in 0..4 {
            e.trajectory.push(TrajectorySample {
                at: e.started_at + Duration::minutes(i),
                level: 0.5,
            });
        }
        assert_eq!(e.level_variance(), 0.0);
    }
}
