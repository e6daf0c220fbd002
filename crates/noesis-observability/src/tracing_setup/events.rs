//! Structured log events for key operations.

/// A query finished and a bundle was returned.
pub fn query_completed(query_id: &str, results: usize, degraded: bool, elapsed_ms: u64) {
    tracing::info!(
        event = "query_completed",
        query_id = %query_id,
        results,
        degraded,
        elapsed_ms,
        "query completed"
    );
}

/// A component fell back to a lower-quality mode.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

/// A degraded component is back to normal.
pub fn degradation_recovered(component: &str) {
    tracing::info!(
        event = "degradation_recovered",
        component = %component,
        "degradation recovered"
    );
}

/// A feedback event changed a fragment's signals.
pub fn feedback_applied(event_id: &str, fragment_id: &str, relevance: f64) {
    tracing::debug!(
        event = "feedback_applied",
        event_id = %event_id,
        fragment_id = %fragment_id,
        relevance,
        "feedback applied"
    );
}

/// A state snapshot superseded the previous one.
pub fn snapshot_accepted(version: u64, level: f64) {
    tracing::debug!(
        event = "snapshot_accepted",
        version,
        level,
        "state snapshot accepted"
    );
}

/// A consolidation pass finished.
pub fn consolidation_completed(examined: usize, merged: usize, skipped: usize) {
    tracing::info!(
        event = "consolidation_completed",
        examined,
        merged,
        skipped,
        "consolidation completed"
    );
}

/// Re-embedding progress after a model change.
pub fn migration_progress(completed: usize, total: usize, model_id: &str) {
    tracing::info!(
        event = "migration_progress",
        completed,
        total,
        model_id = %model_id,
        "embedding migration progress"
    );
}
