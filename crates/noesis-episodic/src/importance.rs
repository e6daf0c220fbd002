//! Episode importance: initial score and half-life decay.

use chrono::{DateTime, Utc};
use noesis_core::models::Episode;

/// Weight of trajectory volatility in the initial score; feedback gets the rest.
const VOLATILITY_WEIGHT: f64 = 0.6;
/// Feedback contribution when no feedback was given.
const NEUTRAL_FEEDBACK: f64 = 0.5;

/// `0.6 · min(1, 2σ) + 0.4 · mean_feedback`, where σ is the standard deviation
/// of the trajectory's state-levels.
pub fn initial_importance(episode: &Episode) -> f64 {
    let volatility = (2.0 * episode.level_variance().sqrt()).min(1.0);
    (VOLATILITY_WEIGHT * volatility + feedback_share(episode)).clamp(0.0, 1.0)
}

fn feedback_share(episode: &Episode) -> f64 {
    (1.0 - VOLATILITY_WEIGHT) * episode.mean_feedback().unwrap_or(NEUTRAL_FEEDBACK)
}

/// `importance` shifted by how much the feedback share moved between
/// `before` and `after`. Decay and consolidation bonuses already folded into
/// `importance` are kept.
pub fn rescored_importance(importance: f64, before: &Episode, after: &Episode) -> f64 {
    (importance + feedback_share(after) - feedback_share(before)).clamp(0.0, 1.0)
}

/// Importance after decaying from `since` to `now` with the given half-life.
pub fn decayed_importance(
    importance: f64,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let elapsed_days = (now - since).num_milliseconds() as f64 / 86_400_000.0;
    if elapsed_days <= 0.0 || half_life_days <= 0.0 {
        return importance;
    }
    (importance * 0.5f64.powf(elapsed_days / half_life_days)).clamp(0.0, 1.0)
}

/// Outcome of one importance decay pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportanceDecayReport {
    pub processed: usize,
    pub decayed: usize,
    /// Episodes retired for falling below the retention threshold.
    pub retired: Vec<String>,
    pub skipped: Vec<String>,
}
