use noesis_core::errors::*;

#[test]
fn dimension_mismatch_carries_both_sizes() {
    let err = NoesisError::DimensionMismatch {
        expected: 384,
        actual: 128,
    };
    let msg = err.to_string();
    assert!(msg.contains("384"));
    assert!(msg.contains("128"));
}

#[test]
fn not_found_carries_kind_and_id() {
    let err = NoesisError::not_found("fragment", "abc-123");
    let msg = err.to_string();
    assert!(msg.contains("fragment"));
    assert!(msg.contains("abc-123"));
}

#[test]
fn strategy_timeout_carries_budget() {
    let err = NoesisError::StrategyTimeout {
        strategy: "semantic".into(),
        budget_ms: 250,
    };
    assert!(err.to_string().contains("250ms"));
}

// --- From impls ---

#[test]
fn index_error_converts() {
    let err: NoesisError = IndexError::CollectionNotFound {
        name: "episodes".into(),
    }
    .into();
    assert!(matches!(err, NoesisError::Index(_)));
    assert!(err.to_string().contains("episodes"));
}

#[test]
fn episode_error_converts() {
    let err: NoesisError = EpisodeError::ConsolidationInProgress.into();
    assert!(matches!(
        err,
        NoesisError::Episode(EpisodeError::ConsolidationInProgress)
    ));
}

#[test]
fn provider_unavailable_is_recognised_in_both_forms() {
    let direct = NoesisError::ProviderUnavailable {
        provider: "remote".into(),
    };
    let nested: NoesisError = EmbeddingError::ProviderUnavailable {
        provider: "remote".into(),
    }
    .into();
    assert!(direct.is_provider_unavailable());
    assert!(nested.is_provider_unavailable());
    assert!(!NoesisError::Cancelled.is_provider_unavailable());
}
