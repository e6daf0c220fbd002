//! Span definitions per operation: retrieval, consolidation, decay, feedback.

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($query_id:expr, $query:expr) => {
        tracing::info_span!("noesis.retrieval", query_id = %$query_id, query = %$query)
    };
}

/// Create a consolidation span.
#[macro_export]
macro_rules! consolidation_span {
    ($episodes:expr) => {
        tracing::info_span!("noesis.consolidation", episodes = $episodes)
    };
}

/// Create a decay span. `$target` names what decays (fragments, episodes).
#[macro_export]
macro_rules! decay_span {
    ($target:expr, $count:expr) => {
        tracing::info_span!("noesis.decay", kind = %$target, count = $count)
    };
}

/// Create a feedback span.
#[macro_export]
macro_rules! feedback_span {
    ($event_id:expr, $fragment_id:expr) => {
        tracing::info_span!("noesis.feedback", event_id = %$event_id, fragment_id = %$fragment_id)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const RETRIEVAL: &str = "noesis.retrieval";
    pub const CONSOLIDATION: &str = "noesis.consolidation";
    pub const DECAY: &str = "noesis.decay";
    pub const FEEDBACK: &str = "noesis.feedback";
}
