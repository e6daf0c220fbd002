//! In-memory embedding cache.
//!
//! [`L1MemoryCache`] is a moka cache keyed by blake3 hashes. [`CachedProvider`]
//! puts it in front of any provider so repeated queries under the same state
//! do not hit the model again.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use noesis_core::errors::NoesisResult;
use noesis_core::models::StateSnapshot;
use noesis_core::traits::IEmbeddingProvider;
use tracing::debug;

use crate::dimensions::validate_dimensions;

/// L1 in-memory embedding cache.
///
/// TinyLFU admission, bounded entry count, idle and absolute TTLs.
pub struct L1MemoryCache {
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl L1MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(3600))
            .time_to_live(Duration::from_secs(86400))
            .build();
        Self { cache }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, embedding: Vec<f32>) {
        self.cache.insert(key, Arc::new(embedding));
    }

    /// Approximate; moka applies pending writes lazily.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Cache key over model, text and the state features that influence the vector.
pub fn cache_key(model_id: &str, text: &str, state: Option<&StateSnapshot>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    if let Some(snapshot) = state {
        hasher.update(&[1]);
        for f in snapshot.features() {
            hasher.update(&f.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Write-through cache in front of another provider.
///
/// Results are validated against the inner provider's dimensions before they
/// are cached, so a misbehaving model never poisons the cache.
pub struct CachedProvider {
    inner: Arc<dyn IEmbeddingProvider>,
    cache: L1MemoryCache,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn IEmbeddingProvider>, max_entries: u64) -> Self {
        Self {
            inner,
            cache: L1MemoryCache::new(max_entries),
        }
    }

    pub fn cache(&self) -> &L1MemoryCache {
        &self.cache
    }

    fn key(&self, text: &str, state: Option<&StateSnapshot>) -> String {
        // Providers that ignore state must not fragment the cache by it.
        let state = state.filter(|_| self.inner.supports_state_context());
        cache_key(self.inner.model_id(), text, state)
    }
}

impl IEmbeddingProvider for CachedProvider {
    fn embed(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        let key = self.key(text, state);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "embedding cache hit");
            return Ok(hit.as_ref().clone());
        }
        let embedding = self.inner.embed(text, state)?;
        validate_dimensions(&embedding, self.inner.dimensions())?;
        self.cache.insert(key, embedding.clone());
        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[String]) -> NoesisResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();
        let mut miss_slots = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(&self.key(text, None)) {
                Some(hit) => out.push(hit.as_ref().clone()),
                None => {
                    out.push(Vec::new());
                    misses.push(text.clone());
                    miss_slots.push(i);
                }
            }
        }
        if !misses.is_empty() {
            let embedded = self.inner.embed_batch(&misses)?;
            for ((slot, text), embedding) in miss_slots.into_iter().zip(&misses).zip(embedded) {
                validate_dimensions(&embedding, self.inner.dimensions())?;
                self.cache.insert(self.key(text, None), embedding.clone());
                out[slot] = embedding;
            }
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn supports_state_context(&self) -> bool {
        self.inner.supports_state_context()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
