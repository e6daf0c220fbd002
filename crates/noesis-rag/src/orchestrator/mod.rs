//! Orchestrator: the top-level façade.
//!
//! Owns the stores, the retrieval engine and the ranker. A query is enhanced
//! with its state snapshot, retrieved, ranked and returned as a
//! [`ResultBundle`]; accesses, degradation and latency are recorded on the way
//! out. Feedback is queued to a background worker.

mod maintenance;

pub use maintenance::MaintenanceReport;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use noesis_core::errors::{EmbeddingError, NoesisError, NoesisResult};
use noesis_core::models::{
    DegradationEvent, Episode, FeedbackEvent, QueryContext, RankedCandidate, ResultBundle,
    StateSnapshot,
};
use noesis_core::traits::IEmbeddingProvider;
use noesis_core::{CancellationToken, KnowledgeFragment, NoesisConfig};
use noesis_embeddings::{CachedProvider, DegradationChain, HashingProvider, EMBEDDINGS_COMPONENT};
use noesis_episodic::EpisodicStore;
use noesis_index::VectorIndex;
use noesis_observability::tracing_setup::events;
use noesis_observability::{retrieval_span, DegradationTracker, QueryLog, QueryLogEntry, TrackedDegradation};
use noesis_retrieval::{Ranker, RetrievalEngine, RetrievalSources};
use noesis_storage::KnowledgeStore;
use serde::Serialize;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::enhancement;
use crate::feedback::{FeedbackProcessor, FeedbackQueue, FeedbackStats};
use crate::ingest;
use crate::intake::StateIntake;
use crate::migration::{MigrationProgress, MigrationReport, MigrationWorker, ProgressSnapshot};

const RETRIEVAL_COMPONENT: &str = "retrieval";

/// Latency and degradation summary over the query log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryStats {
    pub count: usize,
    pub avg_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub degraded_ratio: f64,
}

pub struct Orchestrator {
    config: NoesisConfig,
    store: Arc<KnowledgeStore>,
    index: Arc<VectorIndex>,
    episodes: Arc<EpisodicStore>,
    /// Swapped wholesale when the embedding provider changes.
    engine: RwLock<Arc<RetrievalEngine>>,
    ranker: Ranker,
    intake: StateIntake,
    feedback: FeedbackQueue,
    degradation: Mutex<DegradationTracker>,
    /// Replica chain behind the active provider, if one was configured.
    replicas: RwLock<Option<Arc<DegradationChain>>>,
    query_log: Mutex<QueryLog>,
    migration: RwLock<Arc<MigrationProgress>>,
    migration_lock: tokio::sync::Mutex<()>,
    shutdown: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Orchestrator {
    /// Build every subsystem around `provider`. Must be called inside a
    /// Tokio runtime: the feedback worker is spawned here.
    pub fn new(config: NoesisConfig, provider: Arc<dyn IEmbeddingProvider>) -> NoesisResult<Self> {
        config.validate()?;
        let dimensions = config.embedding.dimensions;
        if provider.dimensions() != dimensions {
            return Err(NoesisError::DimensionMismatch {
                expected: dimensions,
                actual: provider.dimensions(),
            });
        }
        let provider: Arc<dyn IEmbeddingProvider> =
            Arc::new(CachedProvider::new(provider, config.embedding.l1_cache_size));

        let store = Arc::new(KnowledgeStore::with_config(
            provider.model_id(),
            dimensions,
            &config.feedback,
        ));
        let index = Arc::new(VectorIndex::new());
        index.create_collection(&config.index.documents_collection, dimensions)?;
        let episodes = Arc::new(EpisodicStore::new(
            Arc::clone(&index),
            Arc::clone(&provider),
            config.index.episodes_collection.clone(),
            config.episodic.clone(),
        )?);

        let sources = RetrievalSources::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&provider),
            config.index.documents_collection.clone(),
        )
        .with_episodes(Arc::clone(&episodes));
        let engine = RetrievalEngine::new(sources, config.retrieval.clone());
        let ranker = Ranker::new(&config.ranking)?;

        let processor = FeedbackProcessor::new(Arc::clone(&store), config.feedback.clone())
            .with_episodes(Arc::clone(&episodes));
        let feedback = FeedbackQueue::spawn(Arc::new(processor))?;

        info!(
            model = %provider.model_id(),
            dimensions,
            "orchestrator ready"
        );
        Ok(Self {
            store,
            index,
            episodes,
            engine: RwLock::new(Arc::new(engine)),
            ranker,
            intake: StateIntake::new(),
            feedback,
            degradation: Mutex::new(DegradationTracker::new()),
            replicas: RwLock::new(None),
            query_log: Mutex::new(QueryLog::with_capacity(
                config.observability.query_log_capacity,
            )),
            migration: RwLock::new(Arc::new(MigrationProgress::default())),
            migration_lock: tokio::sync::Mutex::new(()),
            shutdown: CancellationToken::new(),
            config,
        })
    }

    /// Orchestrator backed by the built-in hashing provider.
    pub fn with_hashing_provider(config: NoesisConfig) -> NoesisResult<Self> {
        let provider = HashingProvider::new(
            config.embedding.dimensions,
            config.embedding.state_dimensions,
        );
        Self::new(config, Arc::new(provider))
    }

    /// Orchestrator over a replica chain. Answers served by a replica are
    /// tracked as `embeddings` degradations until the primary is back.
    pub fn with_replicas(config: NoesisConfig, chain: DegradationChain) -> NoesisResult<Self> {
        let chain = Arc::new(chain);
        let orchestrator = Self::new(config, Arc::clone(&chain) as Arc<dyn IEmbeddingProvider>)?;
        *orchestrator
            .replicas
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(chain);
        Ok(orchestrator)
    }

    pub fn config(&self) -> &NoesisConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn episodes(&self) -> &Arc<EpisodicStore> {
        &self.episodes
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    pub fn engine(&self) -> Arc<RetrievalEngine> {
        Arc::clone(&self.engine.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The active embedding provider.
    pub fn provider(&self) -> Arc<dyn IEmbeddingProvider> {
        Arc::clone(&self.engine().sources().provider)
    }

    // ── Ingestion ──

    /// Store and index a fragment that already carries an embedding.
    pub fn ingest(&self, fragment: KnowledgeFragment) -> NoesisResult<Arc<KnowledgeFragment>> {
        let stored = self.store.put(fragment)?;
        if let Err(e) =
            ingest::index_fragment(&self.index, &self.config.index.documents_collection, &stored)
        {
            warn!(id = %stored.id, error = %e, "indexing failed, fragment retired");
            self.store.retire(&stored.id)?;
            return Err(e);
        }
        Ok(stored)
    }

    /// Embed a fragment's title and content with the active provider, then ingest it.
    pub fn embed_and_ingest(
        &self,
        mut fragment: KnowledgeFragment,
    ) -> NoesisResult<Arc<KnowledgeFragment>> {
        let provider = self.provider();
        fragment.embedding = provider.embed(&fragment.embedding_text(), None)?;
        fragment.embedding_model = provider.model_id().to_string();
        self.ingest(fragment)
    }

    // ── State ──

    /// Offer a snapshot from the event transport. Stale versions are ignored.
    pub fn offer_snapshot(&self, snapshot: StateSnapshot) -> bool {
        self.intake.offer(snapshot)
    }

    /// The newest accepted snapshot, or a neutral one before any arrives.
    pub fn current_snapshot(&self) -> StateSnapshot {
        self.intake.current().unwrap_or_default()
    }

    /// A query against the current snapshot with the configured defaults.
    pub fn query_context(&self, query: impl Into<String>) -> QueryContext {
        let defaults = &self.config.retrieval;
        QueryContext::new(query, self.current_snapshot())
            .with_max_results(defaults.default_max_results)
            .with_min_relevance(defaults.default_min_relevance)
            .with_timeout(Duration::from_millis(defaults.default_timeout_ms))
    }

    // ── Query ──

    /// Retrieve and rank knowledge for `request`.
    ///
    /// Returns `Cancelled` if the request's token fires before retrieval
    /// completes. Strategy failures and timeouts only mark the bundle degraded.
    pub async fn query(&self, mut request: QueryContext) -> NoesisResult<ResultBundle> {
        let started = Instant::now();
        let query_id = Uuid::new_v4().to_string();
        if request.enhanced_query.is_none() {
            request.enhanced_query = Some(enhancement::enhance_query(
                &request.query,
                &request.snapshot,
            ));
        }

        let span = retrieval_span!(query_id, request.query);
        let engine = self.engine();
        let outcome = engine.retrieve(&request).instrument(span.clone()).await?;

        span.in_scope(|| {
            let query_embedding = outcome.query_embedding.as_deref().map(Vec::as_slice);
            let items = self
                .ranker
                .rank(&outcome.candidates, &request, query_embedding);
            self.record_accesses(&request, &items);

            let bundle = ResultBundle {
                query_id,
                query: request.query.clone(),
                enhanced_query: request.effective_query().to_string(),
                snapshot_version: request.snapshot.version,
                items,
                reports: outcome.reports,
                degraded: outcome.degraded,
                elapsed_ms: millis(started.elapsed()),
            };
            self.track_degradation(&bundle);
            lock(&self.query_log).record(QueryLogEntry::from_bundle(&bundle));
            events::query_completed(
                &bundle.query_id,
                bundle.items.len(),
                bundle.degraded,
                bundle.elapsed_ms,
            );
            Ok(bundle)
        })
    }

    fn record_accesses(&self, request: &QueryContext, items: &[RankedCandidate]) {
        let now = Utc::now();
        let session = request.session_id.as_deref();
        if let Some(session_id) = session {
            if let Err(e) = self.episodes.record_interaction(session_id, &request.query) {
                warn!(session_id, error = %e, "interaction not recorded");
            }
        }
        for item in items {
            if let Err(e) = self.store.record_access(item.id(), now) {
                debug!(id = item.id(), error = %e, "access not recorded");
            }
            if let Some(session_id) = session {
                if let Err(e) = self.episodes.record_access(session_id, item.id()) {
                    debug!(session_id, id = item.id(), error = %e, "session access not recorded");
                }
            }
        }
    }

    fn track_degradation(&self, bundle: &ResultBundle) {
        let mut tracker = lock(&self.degradation);
        let replicas = self
            .replicas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(chain) = replicas {
            for event in chain.drain_events() {
                tracker.record(event);
            }
            if chain.primary_available() {
                tracker.mark_recovered(EMBEDDINGS_COMPONENT);
            }
        }
        if !bundle.degraded {
            tracker.mark_recovered(RETRIEVAL_COMPONENT);
            return;
        }
        let failure = bundle
            .reports
            .iter()
            .filter(|r| !r.status.is_success() || r.fallback)
            .map(|r| format!("{}: {:?}", r.strategy, r.status))
            .collect::<Vec<_>>()
            .join("; ");
        let fallback = if bundle.reports.iter().any(|r| r.fallback) {
            "keyword search"
        } else {
            "partial results"
        };
        tracker.record(DegradationEvent {
            component: RETRIEVAL_COMPONENT.to_string(),
            failure,
            fallback_used: fallback.to_string(),
            timestamp: Utc::now(),
        });
    }

    // ── Feedback ──

    /// Queue relevance feedback. Applied asynchronously.
    pub fn submit_feedback(&self, event: FeedbackEvent) {
        self.feedback.submit(event);
    }

    /// Wait for every feedback event queued so far to be applied.
    pub async fn flush_feedback(&self) {
        self.feedback.flush().await;
    }

    pub fn feedback_stats(&self) -> FeedbackStats {
        self.feedback.stats()
    }

    // ── Sessions ──

    pub fn open_session(&self, session_id: &str, user_id: &str) -> NoesisResult<()> {
        self.episodes.open_session(session_id, user_id, Utc::now())
    }

    pub fn record_state_sample(&self, session_id: &str, level: f64) -> NoesisResult<()> {
        self.episodes.record_sample(session_id, Utc::now(), level)
    }

    pub fn close_session(&self, session_id: &str) -> NoesisResult<Arc<Episode>> {
        self.episodes.close_session(session_id, Utc::now())
    }

    // ── Embedding migration ──

    /// Switch to `provider` and re-embed every fragment in the background pool.
    ///
    /// Queries keep working during the migration; fragments are served by
    /// similarity again as soon as they are re-embedded. Migrations run one
    /// at a time.
    pub async fn migrate(
        &self,
        provider: Arc<dyn IEmbeddingProvider>,
    ) -> NoesisResult<MigrationReport> {
        let _running = self.migration_lock.lock().await;
        let dimensions = provider.dimensions();
        let provider: Arc<dyn IEmbeddingProvider> =
            Arc::new(CachedProvider::new(provider, self.config.embedding.l1_cache_size));
        let collection = self.config.index.documents_collection.clone();

        let stale = self.store.mark_model(provider.model_id(), dimensions);
        if self.index.dimensions(&collection)? != dimensions {
            self.index.drop_collection(&collection);
            self.index.create_collection(&collection, dimensions)?;
        }

        let current = self.engine();
        let mut sources = current.sources().clone();
        sources.provider = Arc::clone(&provider);
        let engine = Arc::new(RetrievalEngine::new(sources, current.config().clone()));
        *self.engine.write().unwrap_or_else(PoisonError::into_inner) = engine;
        *self.replicas.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!(model = %provider.model_id(), dimensions, stale, "embedding migration started");

        let progress = Arc::new(MigrationProgress::new(stale as u64));
        *self.migration.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&progress);
        let worker = MigrationWorker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.index),
            provider,
            collection,
        );
        let cancel = self.shutdown.child_token();
        tokio::task::spawn_blocking(move || worker.run(&progress, &cancel))
            .await
            .map_err(|e| {
                EmbeddingError::InferenceFailed {
                    reason: format!("migration worker did not finish: {e}"),
                }
                .into()
            })
    }

    pub fn migration_progress(&self) -> ProgressSnapshot {
        self.migration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    // ── Observability ──

    /// Degradations not yet followed by a clean query.
    pub fn active_degradations(&self) -> Vec<TrackedDegradation> {
        lock(&self.degradation)
            .active_degradations()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn query_stats(&self) -> QueryStats {
        let log = lock(&self.query_log);
        QueryStats {
            count: log.count(),
            avg_latency_ms: millis(log.avg_latency()),
            p95_latency_ms: millis(log.latency_percentile(0.95)),
            degraded_ratio: log.degraded_ratio(),
        }
    }

    // ── Lifecycle ──

    /// Token cancelled on shutdown; background loops listen on children of it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop background loops and drain queued feedback.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.feedback.flush().await;
        info!("orchestrator stopped");
    }
}
