//! Re-embedding worker.
//!
//! Stale fragments are migrated highest priority first, in batches with a
//! throttle between them. A failed batch call falls back to embedding its
//! items one by one; items that still fail are logged and skipped.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use noesis_core::errors::{EmbeddingError, NoesisResult};
use noesis_core::traits::IEmbeddingProvider;
use noesis_core::{CancellationToken, KnowledgeFragment};
use noesis_index::VectorIndex;
use noesis_observability::tracing_setup::events;
use noesis_storage::KnowledgeStore;
use serde::Serialize;
use tracing::{info, warn};

use super::progress::MigrationProgress;
use crate::ingest;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub batch_size: usize,
    /// Pause between batches so queries are not starved of the provider.
    pub throttle: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            throttle: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub model_id: String,
    pub total: usize,
    pub migrated: usize,
    /// Ids left stale.
    pub failed: Vec<String>,
    pub cancelled: bool,
}

fn migration_priority(fragment: &KnowledgeFragment) -> f64 {
    let value = (fragment.signals.quality + fragment.signals.authority) / 2.0;
    value * (1.0 + (fragment.access_count as f64).ln_1p() * 0.2)
}

/// Highest priority first; ties by id.
pub fn prioritize(fragments: &mut [Arc<KnowledgeFragment>]) {
    fragments.sort_by(|a, b| {
        migration_priority(b)
            .partial_cmp(&migration_priority(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn reembed_batch(
    batch: &[Arc<KnowledgeFragment>],
    provider: &dyn IEmbeddingProvider,
) -> Vec<NoesisResult<Vec<f32>>> {
    let texts: Vec<String> = batch.iter().map(|f| f.embedding_text()).collect();
    let batch_error = match provider.embed_batch(&texts) {
        Ok(embeddings) if embeddings.len() == batch.len() => {
            return embeddings.into_iter().map(Ok).collect();
        }
        Ok(embeddings) => EmbeddingError::InferenceFailed {
            reason: format!("{} embeddings for {} texts", embeddings.len(), batch.len()),
        }
        .into(),
        Err(e) => e,
    };
    warn!(error = %batch_error, size = batch.len(), "batch re-embedding failed, falling back to individual");
    texts.iter().map(|text| provider.embed(text, None)).collect()
}

/// Re-embeds stale fragments with the active provider.
pub struct MigrationWorker {
    store: Arc<KnowledgeStore>,
    index: Arc<VectorIndex>,
    provider: Arc<dyn IEmbeddingProvider>,
    collection: String,
    config: WorkerConfig,
}

impl MigrationWorker {
    pub fn new(
        store: Arc<KnowledgeStore>,
        index: Arc<VectorIndex>,
        provider: Arc<dyn IEmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index,
            provider,
            collection: collection.into(),
            config: WorkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Migrate every stale fragment. Blocks; run it off the async executor.
    pub fn run(&self, progress: &MigrationProgress, cancel: &CancellationToken) -> MigrationReport {
        let model_id = self.provider.model_id().to_string();
        let mut fragments: Vec<Arc<KnowledgeFragment>> = self
            .store
            .stale_ids()
            .iter()
            .filter_map(|id| self.store.get(id).ok())
            .collect();
        prioritize(&mut fragments);

        let mut report = MigrationReport {
            model_id: model_id.clone(),
            total: fragments.len(),
            ..Default::default()
        };
        progress.start(fragments.len() as u64);

        for (i, batch) in fragments.chunks(self.config.batch_size.max(1)).enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                progress.mark_cancelled();
                info!(migrated = report.migrated, total = report.total, "embedding migration cancelled");
                return report;
            }
            if i > 0 && !self.config.throttle.is_zero() {
                std::thread::sleep(self.config.throttle);
            }

            let embedded = reembed_batch(batch, self.provider.as_ref());
            for (fragment, result) in batch.iter().zip(embedded) {
                match result.and_then(|embedding| self.commit(fragment, embedding, &model_id)) {
                    Ok(()) => {
                        progress.record_success();
                        report.migrated += 1;
                    }
                    Err(e) => {
                        warn!(id = %fragment.id, error = %e, "re-embedding skipped fragment");
                        progress.record_failure();
                        report.failed.push(fragment.id.clone());
                    }
                }
            }
            events::migration_progress(
                report.migrated + report.failed.len(),
                report.total,
                &model_id,
            );
        }

        progress.mark_complete();
        info!(
            model = %model_id,
            migrated = report.migrated,
            failed = report.failed.len(),
            "embedding migration complete"
        );
        report
    }

    /// Index first: until the store accepts the new vector the fragment
    /// stays stale and is never served from the index.
    fn commit(
        &self,
        fragment: &KnowledgeFragment,
        embedding: Vec<f32>,
        model_id: &str,
    ) -> NoesisResult<()> {
        let mut next = fragment.clone();
        next.embedding = embedding;
        next.embedding_model = model_id.to_string();
        ingest::index_fragment(&self.index, &self.collection, &next)?;
        self.store
            .replace_embedding(&fragment.id, next.embedding, model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::FragmentBuilder;

    fn frag(id: &str, quality: f64, accesses: u64) -> Arc<KnowledgeFragment> {
        let mut f = FragmentBuilder::new(id, "content")
            .quality(quality)
            .authority(quality)
            .embedding(vec![1.0], "m");
        f.access_count = accesses;
        Arc::new(f)
    }

    #[test]
    fn prioritizes_valuable_fragments() {
        let mut fragments = vec![frag("a", 0.2, 0), frag("b", 0.9, 0), frag("c", 0.2, 100)];
        prioritize(&mut fragments);
        let ids: Vec<&str> = fragments.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn ties_order_by_id() {
        let mut fragments = vec![frag("z", 0.5, 1), frag("a", 0.5, 1)];
        prioritize(&mut fragments);
        assert_eq!(fragments[0].id, "a");
    }
}
