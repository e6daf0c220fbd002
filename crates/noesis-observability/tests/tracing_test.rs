use noesis_core::config::ObservabilityConfig;
use noesis_observability::tracing_setup::{events, spans};
use noesis_observability::{decay_span, feedback_span, init_tracing, retrieval_span};

#[test]
fn init_is_idempotent_and_spans_enter() {
    let config = ObservabilityConfig::default();
    init_tracing(&config);
    init_tracing(&config);

    let span = retrieval_span!("q-1", "breathing");
    let _guard = span.enter();
    events::query_completed("q-1", 3, false, 12);

    let decay = decay_span!("fragments", 10usize);
    decay.in_scope(|| events::migration_progress(1, 2, "fake-v1"));
    feedback_span!("ev-1", "frag-1").in_scope(|| events::feedback_applied("ev-1", "frag-1", 0.9));

    assert_eq!(spans::names::RETRIEVAL, "noesis.retrieval");
}
