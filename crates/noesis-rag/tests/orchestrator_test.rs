//! Orchestrator end to end: query flow, state intake, feedback, sessions,
//! maintenance and embedding migration.

use std::sync::Arc;
use std::time::Duration;

use noesis_core::models::{FeedbackEvent, StateSnapshot, Strategy};
use noesis_core::{CancellationToken, NoesisConfig, NoesisError};
use noesis_embeddings::DegradationChain;
use noesis_rag::{MigrationStatus, Orchestrator};
use test_fixtures::{load_corpus, user, FakeProvider, FragmentBuilder, TEST_DIMENSIONS};

fn config() -> NoesisConfig {
    let mut config = NoesisConfig::default();
    config.embedding.dimensions = TEST_DIMENSIONS;
    config
}

fn orchestrator() -> (Orchestrator, FakeProvider) {
    let provider = FakeProvider::standard();
    let orch = Orchestrator::new(config(), Arc::new(provider.clone())).unwrap();
    for fragment in load_corpus(&provider) {
        orch.ingest(fragment).unwrap();
    }
    (orch, provider)
}

// ── Query flow ──

#[tokio::test]
async fn query_ranks_matching_fragment_first() {
    let (orch, _) = orchestrator();
    assert!(orch.offer_snapshot(StateSnapshot::new(1, 0.2)));

    let bundle = orch
        .query(orch.query_context("slow breathing exercise"))
        .await
        .unwrap();

    assert!(!bundle.degraded);
    assert_eq!(bundle.items[0].id(), "frag-breathing");
    assert_eq!(bundle.snapshot_version, 1);
    assert!(bundle.enhanced_query.contains("low awareness"));
    assert_eq!(bundle.reports.len(), 1);
    assert_eq!(bundle.reports[0].strategy, Strategy::Hybrid);
    assert!(!bundle.query_id.is_empty());
}

#[tokio::test]
async fn returned_fragments_are_marked_accessed() {
    let (orch, _) = orchestrator();
    let bundle = orch
        .query(orch.query_context("slow breathing exercise"))
        .await
        .unwrap();
    for id in bundle.ids() {
        assert_eq!(orch.store().get(id).unwrap().access_count, 1);
    }
}

#[tokio::test]
async fn cancelled_query_returns_cancelled_and_is_not_logged() {
    let (orch, _) = orchestrator();
    let token = CancellationToken::new();
    token.cancel();
    let request = orch.query_context("breathing").with_cancellation(token);

    let err = orch.query(request).await.unwrap_err();
    assert!(matches!(err, NoesisError::Cancelled));
    assert_eq!(orch.query_stats().count, 0);
}

#[tokio::test]
async fn query_stats_count_every_answered_query() {
    let (orch, _) = orchestrator();
    orch.query(orch.query_context("breathing")).await.unwrap();
    orch.query(orch.query_context("attention")).await.unwrap();
    let stats = orch.query_stats();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.degraded_ratio, 0.0);
}

// ── State intake ──

#[tokio::test]
async fn stale_and_repeated_snapshots_are_ignored() {
    let (orch, _) = orchestrator();
    assert!(orch.offer_snapshot(StateSnapshot::new(2, 0.3)));
    assert!(!orch.offer_snapshot(StateSnapshot::new(2, 0.3)));
    assert!(!orch.offer_snapshot(StateSnapshot::new(1, 0.9)));
    assert_eq!(orch.current_snapshot().version, 2);
    assert_eq!(orch.query_context("q").snapshot.level, 0.3);
}

// ── Degradation ──

#[tokio::test]
async fn provider_loss_degrades_to_keyword_then_recovers() {
    let (orch, provider) = orchestrator();
    provider.set_available(false);

    let bundle = orch
        .query(orch.query_context("pasta sauce with garlic"))
        .await
        .unwrap();
    assert!(bundle.degraded);
    assert!(bundle.ids().contains(&"frag-cooking"));
    assert!(bundle.report(Strategy::Hybrid).unwrap().fallback);
    assert_eq!(orch.active_degradations().len(), 1);

    provider.set_available(true);
    let bundle = orch
        .query(orch.query_context("information integration"))
        .await
        .unwrap();
    assert!(!bundle.degraded);
    assert!(orch.active_degradations().is_empty());
}

#[tokio::test]
async fn replica_answers_are_tracked_until_primary_returns() {
    let primary = FakeProvider::standard();
    let replica = FakeProvider::standard();
    let mut chain = DegradationChain::new(Arc::new(primary.clone()));
    chain.push(Arc::new(replica.clone())).unwrap();
    let orch = Orchestrator::with_replicas(config(), chain).unwrap();
    for fragment in load_corpus(&primary) {
        orch.ingest(fragment).unwrap();
    }
    assert_eq!(orch.provider().model_id(), "fake-v1");

    primary.set_available(false);
    let bundle = orch
        .query(orch.query_context("slow breathing exercise"))
        .await
        .unwrap();
    assert!(!bundle.degraded);
    assert!(bundle.ids().contains(&"frag-breathing"));
    let active = orch.active_degradations();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].event.component, "embeddings");
    assert_eq!(active[0].event.fallback_used, "replica 1");
    assert_eq!(orch.provider().model_id(), "fake-v1");

    primary.set_available(true);
    orch.query(orch.query_context("information integration"))
        .await
        .unwrap();
    assert!(orch.active_degradations().is_empty());
}

// ── Feedback ──

#[tokio::test]
async fn feedback_is_applied_once_per_event_id() {
    let (orch, _) = orchestrator();
    let before = orch.store().get("frag-breathing").unwrap().signals.quality;

    let event = FeedbackEvent::new("evt-1", "frag-breathing", 1.0).with_user("u1");
    orch.submit_feedback(event.clone());
    orch.submit_feedback(event);
    orch.flush_feedback().await;

    let after = orch.store().get("frag-breathing").unwrap();
    assert!((after.signals.quality - (before + 0.05)).abs() < 1e-9);
    assert_eq!(after.feedback_scores.len(), 1);
    let stats = orch.feedback_stats();
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.duplicates, 1);
}

#[tokio::test]
async fn feedback_for_unknown_fragment_is_rejected_quietly() {
    let (orch, _) = orchestrator();
    orch.submit_feedback(FeedbackEvent::new("evt-1", "missing", 0.9));
    orch.flush_feedback().await;
    assert_eq!(orch.feedback_stats().rejected, 1);
}

// ── Sessions and episodic memory ──

#[tokio::test]
async fn session_queries_become_episodes_that_feed_pattern_search() {
    let (orch, _) = orchestrator();
    orch.open_session("s1", "u1").unwrap();
    orch.record_state_sample("s1", 0.5).unwrap();

    let request = orch
        .query_context("reflective journaling")
        .with_user(user("u1", &[]))
        .with_session("s1");
    let first = orch.query(request).await.unwrap();
    assert!(!first.is_empty());

    let episode = orch.close_session("s1").unwrap();
    assert!(episode
        .interactions
        .iter()
        .any(|i| i == "reflective journaling"));
    assert!(episode.accessed_fragments.contains("frag-journaling"));

    let request = orch
        .query_context("reflective journaling")
        .with_user(user("u1", &[]))
        .with_strategies(vec![Strategy::ConsciousnessPattern]);
    let recalled = orch.query(request).await.unwrap();
    assert!(recalled.ids().contains(&"frag-journaling"));

    let stranger = orch
        .query_context("reflective journaling")
        .with_user(user("u2", &[]))
        .with_strategies(vec![Strategy::ConsciousnessPattern]);
    assert!(orch.query(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn episode_feedback_rescores_importance() {
    let (orch, _) = orchestrator();
    orch.open_session("s1", "u1").unwrap();
    orch.record_state_sample("s1", 0.5).unwrap();
    orch.episodes()
        .record_access("s1", "frag-journaling")
        .unwrap();
    let episode = orch.close_session("s1").unwrap();

    orch.submit_feedback(
        FeedbackEvent::new("evt-1", "frag-journaling", 1.0).with_episode(episode.id.clone()),
    );
    orch.flush_feedback().await;

    let rescored = orch.episodes().get(&episode.id).unwrap();
    assert!(rescored.importance > episode.importance);
}

// ── Ingestion ──

#[tokio::test]
async fn embed_and_ingest_uses_active_provider() {
    let (orch, _) = orchestrator();
    let fragment = FragmentBuilder::new("frag-new", "Box breathing calms the nervous system.")
        .embedding(Vec::new(), "");
    let stored = orch.embed_and_ingest(fragment).unwrap();
    assert_eq!(stored.embedding.len(), TEST_DIMENSIONS);
    assert_eq!(stored.embedding_model, "fake-v1");
    assert!(orch.index().contains("documents", "frag-new").unwrap());
}

#[tokio::test]
async fn provider_with_wrong_dimensions_is_rejected() {
    let result = Orchestrator::new(config(), Arc::new(FakeProvider::new(8, "tiny")));
    assert!(matches!(
        result.err(),
        Some(NoesisError::DimensionMismatch { expected, actual: 8 }) if expected == TEST_DIMENSIONS
    ));
}

// ── Maintenance ──

#[tokio::test]
async fn maintenance_decays_recency_and_runs_consolidation() {
    let (orch, _) = orchestrator();
    let later = chrono::Utc::now() + chrono::Duration::days(30);
    let report = orch.run_maintenance(later);
    assert_eq!(report.fragments.processed, 6);
    assert_eq!(report.fragments.decayed, 6);
    assert!(report.consolidation.is_some());
    assert!(orch.store().get("frag-breathing").unwrap().signals.recency < 1.0);
}

#[tokio::test]
async fn maintenance_loop_stops_on_shutdown() {
    let provider = FakeProvider::standard();
    let mut config = config();
    config.decay.processing_interval_secs = 1;
    let orch = Arc::new(Orchestrator::new(config, Arc::new(provider)).unwrap());

    let handle = orch.spawn_maintenance();
    orch.shutdown().await;
    let stopped = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(stopped, Ok(Ok(()))));
}

// ── Embedding migration ──

#[tokio::test]
async fn migration_reembeds_every_fragment() {
    let (orch, _) = orchestrator();
    let report = orch
        .migrate(Arc::new(FakeProvider::new(TEST_DIMENSIONS, "fake-v2")))
        .await
        .unwrap();

    assert_eq!(report.total, 6);
    assert_eq!(report.migrated, 6);
    assert!(report.failed.is_empty());
    assert!(orch.store().stale_ids().is_empty());
    assert_eq!(orch.migration_progress().status, MigrationStatus::Complete);
    for id in orch.store().ids() {
        assert_eq!(orch.store().get(&id).unwrap().embedding_model, "fake-v2");
    }

    let bundle = orch
        .query(orch.query_context("slow breathing exercise"))
        .await
        .unwrap();
    assert!(!bundle.degraded);
    assert!(bundle.ids().contains(&"frag-breathing"));
}

#[tokio::test]
async fn migration_to_new_dimensions_rebuilds_the_collection() {
    let (orch, _) = orchestrator();
    let report = orch
        .migrate(Arc::new(FakeProvider::new(16, "fake-small")))
        .await
        .unwrap();
    assert_eq!(report.migrated, 6);
    assert_eq!(orch.index().dimensions("documents").unwrap(), 16);

    let bundle = orch
        .query(orch.query_context("population dynamics"))
        .await
        .unwrap();
    assert!(!bundle.is_empty());
    assert!(bundle.items.iter().all(|c| c.fragment.embedding.len() == 16));
}

#[tokio::test]
async fn unavailable_new_provider_leaves_fragments_stale() {
    let (orch, _) = orchestrator();
    let next = FakeProvider::new(TEST_DIMENSIONS, "fake-v2");
    next.set_available(false);
    let report = orch.migrate(Arc::new(next)).await.unwrap();

    assert_eq!(report.migrated, 0);
    assert_eq!(report.failed.len(), 6);
    assert_eq!(orch.store().stale_ids().len(), 6);

    // Nothing is retrievable until it has been re-embedded.
    let bundle = orch
        .query(orch.query_context("pasta sauce"))
        .await
        .unwrap();
    assert!(bundle.degraded);
    assert!(bundle.is_empty());
}
