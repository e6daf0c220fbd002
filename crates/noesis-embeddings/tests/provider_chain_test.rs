//! Replica chain behaviour under availability changes.

use std::sync::Arc;

use noesis_core::errors::{EmbeddingError, NoesisError};
use noesis_core::models::StateSnapshot;
use noesis_core::similarity::cosine_similarity;
use noesis_core::traits::IEmbeddingProvider;
use noesis_embeddings::{CachedProvider, DegradationChain, HashingProvider};
use test_fixtures::FakeProvider;

/// Primary plus one replica of the same model with its own availability switch.
fn chain_with(primary: &FakeProvider, replica: &FakeProvider) -> DegradationChain {
    let mut chain = DegradationChain::new(Arc::new(primary.clone()));
    chain.push(Arc::new(replica.clone())).unwrap();
    chain
}

#[test]
fn unavailable_primary_falls_back_to_replica_in_same_space() {
    let primary = FakeProvider::new(64, "fake-primary");
    let replica = FakeProvider::new(64, "fake-primary");
    let chain = chain_with(&primary, &replica);
    let expected = primary.embed("focus", None).unwrap();

    primary.set_available(false);
    let (vector, position) = chain.embed_with_source("focus", None).unwrap();
    assert_eq!(position, 1);
    assert_eq!(vector, expected);
    assert_eq!(chain.model_id(), "fake-primary");
    // Skipped providers are not called at all.
    assert_eq!(primary.calls(), 1);
    assert_eq!(chain.drain_events().len(), 1);

    primary.set_available(true);
    let (_, position) = chain.embed_with_source("focus", None).unwrap();
    assert_eq!(position, 0);
    assert!(chain.drain_events().is_empty());
}

#[test]
fn a_different_model_cannot_join_the_chain() {
    let primary = FakeProvider::new(64, "fake-primary");
    let mut chain = DegradationChain::new(Arc::new(primary));
    let err = chain
        .push(Arc::new(HashingProvider::new(64, 4)))
        .unwrap_err();
    assert!(matches!(
        err,
        NoesisError::Embedding(EmbeddingError::ModelMismatch { .. })
    ));
}

#[test]
fn no_replica_available_is_provider_unavailable() {
    let primary = FakeProvider::new(64, "fake-primary");
    let replica = FakeProvider::new(64, "fake-primary");
    let chain = chain_with(&primary, &replica);
    primary.set_available(false);
    replica.set_available(false);

    assert!(!chain.is_available());
    assert!(chain.embed("focus", None).unwrap_err().is_provider_unavailable());
}

#[test]
fn cache_in_front_of_chain_avoids_repeat_calls() {
    let primary = FakeProvider::new(64, "fake-primary");
    let replica = FakeProvider::new(64, "fake-primary");
    let cached = CachedProvider::new(Arc::new(chain_with(&primary, &replica)), 64);

    let a = cached.embed("integration theory", None).unwrap();
    let b = cached.embed("integration theory", None).unwrap();
    assert_eq!(a, b);
    assert_eq!(primary.calls(), 1);
}

#[test]
fn state_context_shifts_similarity_toward_matching_state() {
    let p = HashingProvider::new(128, 8);
    let calm = StateSnapshot::new(1, 0.1);
    let alert = StateSnapshot::new(2, 0.9);

    let doc = p.embed("reflective journaling", Some(&alert)).unwrap();
    let same_state = p.embed("reflective journaling", Some(&alert)).unwrap();
    let other_state = p.embed("reflective journaling", Some(&calm)).unwrap();

    assert!(cosine_similarity(&doc, &same_state) > cosine_similarity(&doc, &other_state));
}
