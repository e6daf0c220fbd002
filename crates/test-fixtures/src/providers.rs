use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use noesis_core::errors::{EmbeddingError, NoesisResult};
use noesis_core::models::StateSnapshot;
use noesis_core::similarity;
use noesis_core::text;
use noesis_core::traits::IEmbeddingProvider;

use crate::TEST_DIMENSIONS;

/// Deterministic bag-of-words provider with an availability switch.
///
/// Each token sets one bucket, so texts that share tokens have positive
/// cosine similarity and disjoint texts are orthogonal (modulo collisions).
#[derive(Clone)]
pub struct FakeProvider {
    dimensions: usize,
    model_id: String,
    available: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(dimensions: usize, model_id: &str) -> Self {
        Self {
            dimensions,
            model_id: model_id.to_string(),
            available: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn standard() -> Self {
        Self::new(TEST_DIMENSIONS, "fake-v1")
    }

    /// Flip availability; clones share the switch.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, token: &str) -> usize {
        let h = token
            .bytes()
            .fold(5381u64, |h, b| h.wrapping_mul(33) ^ b as u64);
        (h % self.dimensions as u64) as usize
    }
}

impl IEmbeddingProvider for FakeProvider {
    fn embed(&self, input: &str, _state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return Err(EmbeddingError::ProviderUnavailable {
                provider: self.model_id.clone(),
            }
            .into());
        }
        let mut v = vec![0.0f32; self.dimensions];
        for token in text::tokenize(input) {
            v[self.bucket(&token)] += 1.0;
        }
        if v.iter().all(|x| *x == 0.0) {
            v[0] = 1.0;
        }
        similarity::normalize(&mut v);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Wraps a provider and sleeps before every call.
pub struct SlowProvider<P> {
    inner: P,
    delay: Duration,
}

impl<P: IEmbeddingProvider> SlowProvider<P> {
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<P: IEmbeddingProvider> IEmbeddingProvider for SlowProvider<P> {
    fn embed(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        std::thread::sleep(self.delay);
        self.inner.embed(text, state)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
