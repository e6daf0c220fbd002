use chrono::{DateTime, Utc};

/// Multiplicative half-life factor for `elapsed_hours`. Negative or non-finite
/// elapsed time yields 1.0.
pub fn decay_factor(elapsed_hours: f64, half_life_hours: f64) -> f64 {
    if !elapsed_hours.is_finite() || elapsed_hours <= 0.0 || half_life_hours <= 0.0 {
        return 1.0;
    }
    0.5f64.powf(elapsed_hours / half_life_hours)
}

/// Recency after decaying from `since` to `now`.
pub fn decayed_recency(
    recency: f64,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_hours: f64,
) -> f64 {
    let elapsed_hours = (now - since).num_milliseconds() as f64 / 3_600_000.0;
    (recency * decay_factor(elapsed_hours, half_life_hours)).clamp(0.0, 1.0)
}
