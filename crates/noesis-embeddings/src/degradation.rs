//! Ordered fallback across replicas of one embedding model.
//!
//! Every provider in the chain serves the primary's model at the primary's
//! dimensionality, so any answer lands in the same vector space as the
//! stored fragments. Answers from a replica other than the primary record a
//! `DegradationEvent`; per-provider failures are logged and the next replica
//! is tried.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use noesis_core::errors::{EmbeddingError, NoesisResult};
use noesis_core::models::{DegradationEvent, StateSnapshot};
use noesis_core::traits::IEmbeddingProvider;
use tracing::warn;

use crate::dimensions::validate_dimensions;

/// Component name on recorded degradation events.
pub const EMBEDDINGS_COMPONENT: &str = "embeddings";

/// Fallback chain over replicas of the primary's model.
pub struct DegradationChain {
    primary: Arc<dyn IEmbeddingProvider>,
    replicas: Vec<Arc<dyn IEmbeddingProvider>>,
    events: Mutex<Vec<DegradationEvent>>,
}

impl DegradationChain {
    pub fn new(primary: Arc<dyn IEmbeddingProvider>) -> Self {
        Self {
            primary,
            replicas: Vec::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Append a replica. It must serve the primary's model id and dimensions.
    pub fn push(&mut self, replica: Arc<dyn IEmbeddingProvider>) -> NoesisResult<()> {
        if replica.model_id() != self.primary.model_id() {
            return Err(EmbeddingError::ModelMismatch {
                expected: self.primary.model_id().to_string(),
                actual: replica.model_id().to_string(),
            }
            .into());
        }
        if replica.dimensions() != self.primary.dimensions() {
            return Err(EmbeddingError::WrongDimensions {
                provider: replica.model_id().to_string(),
                expected: self.primary.dimensions(),
                actual: replica.dimensions(),
            }
            .into());
        }
        self.replicas.push(replica);
        Ok(())
    }

    fn providers(&self) -> impl Iterator<Item = &Arc<dyn IEmbeddingProvider>> {
        std::iter::once(&self.primary).chain(self.replicas.iter())
    }

    /// Embed with the first provider that answers, returning its position in
    /// the chain (0 is the primary).
    pub fn embed_with_source(
        &self,
        text: &str,
        state: Option<&StateSnapshot>,
    ) -> NoesisResult<(Vec<f32>, usize)> {
        self.run(|p| p.embed(text, state).map(|v| vec![v]))
            .map(|(mut vecs, position)| (vecs.pop().unwrap_or_default(), position))
    }

    fn run<F>(&self, call: F) -> NoesisResult<(Vec<Vec<f32>>, usize)>
    where
        F: Fn(&dyn IEmbeddingProvider) -> NoesisResult<Vec<Vec<f32>>>,
    {
        let dimensions = self.primary.dimensions();
        let mut last_error = None;
        for (position, provider) in self.providers().enumerate() {
            if !provider.is_available() {
                continue;
            }
            let result = call(provider.as_ref()).and_then(|vecs| {
                for v in &vecs {
                    validate_dimensions(v, dimensions)?;
                }
                Ok(vecs)
            });
            match result {
                Ok(vecs) => {
                    if position > 0 {
                        self.record_fallback(position);
                    }
                    return Ok((vecs, position));
                }
                Err(e) => {
                    warn!(
                        model = provider.model_id(),
                        position,
                        error = %e,
                        "replica failed, trying next in chain"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            EmbeddingError::ProviderUnavailable {
                provider: format!("{} (primary and {} replicas)", self.primary.model_id(), self.replica_count()),
            }
            .into()
        }))
    }

    fn record_fallback(&self, position: usize) {
        if let Ok(mut events) = self.events.lock() {
            events.push(DegradationEvent {
                component: EMBEDDINGS_COMPONENT.to_string(),
                failure: format!("{} primary unavailable", self.primary.model_id()),
                fallback_used: format!("replica {position}"),
                timestamp: Utc::now(),
            });
        }
    }

    /// Whether the primary itself is serving.
    pub fn primary_available(&self) -> bool {
        self.primary.is_available()
    }

    /// Drain accumulated degradation events.
    pub fn drain_events(&self) -> Vec<DegradationEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    /// Replicas behind the primary.
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}

impl IEmbeddingProvider for DegradationChain {
    fn embed(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        self.embed_with_source(text, state).map(|(v, _)| v)
    }

    fn embed_batch(&self, texts: &[String]) -> NoesisResult<Vec<Vec<f32>>> {
        self.run(|p| p.embed_batch(texts)).map(|(vecs, _)| vecs)
    }

    fn dimensions(&self) -> usize {
        self.primary.dimensions()
    }

    /// Always the primary's model: every replica serves it.
    fn model_id(&self) -> &str {
        self.primary.model_id()
    }

    fn supports_state_context(&self) -> bool {
        self.primary.supports_state_context()
    }

    fn is_available(&self) -> bool {
        self.providers().any(|p| p.is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noesis_core::errors::NoesisError;

    struct FailingProvider;
    impl IEmbeddingProvider for FailingProvider {
        fn embed(&self, _text: &str, _state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
            Err(EmbeddingError::InferenceFailed {
                reason: "mock failure".to_string(),
            }
            .into())
        }
        fn dimensions(&self) -> usize {
            16
        }
        fn model_id(&self) -> &str {
            "m"
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    struct ConstProvider {
        name: String,
        dims: usize,
        output_dims: usize,
        fill: f32,
    }
    impl IEmbeddingProvider for ConstProvider {
        fn embed(&self, _text: &str, _state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
            Ok(vec![self.fill; self.output_dims])
        }
        fn dimensions(&self) -> usize {
            self.dims
        }
        fn model_id(&self) -> &str {
            &self.name
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    fn constant(name: &str, dims: usize, fill: f32) -> Arc<dyn IEmbeddingProvider> {
        Arc::new(ConstProvider {
            name: name.to_string(),
            dims,
            output_dims: dims,
            fill,
        })
    }

    #[test]
    fn primary_succeeds_no_degradation() {
        let mut chain = DegradationChain::new(constant("m", 16, 1.0));
        chain.push(constant("m", 16, 2.0)).unwrap();

        let (vec, position) = chain.embed_with_source("test", None).unwrap();
        assert_eq!(position, 0);
        assert_eq!(vec, vec![1.0; 16]);
        assert!(chain.drain_events().is_empty());
    }

    #[test]
    fn fallback_on_primary_failure() {
        let mut chain = DegradationChain::new(Arc::new(FailingProvider));
        chain.push(constant("m", 16, 2.0)).unwrap();

        let (vec, position) = chain.embed_with_source("test", None).unwrap();
        assert_eq!(position, 1);
        assert_eq!(vec, vec![2.0; 16]);
        assert_eq!(chain.model_id(), "m");

        let events = chain.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].component, EMBEDDINGS_COMPONENT);
        assert_eq!(events[0].fallback_used, "replica 1");
        assert!(chain.drain_events().is_empty());
    }

    #[test]
    fn wrong_output_length_falls_through() {
        let mut chain = DegradationChain::new(Arc::new(ConstProvider {
            name: "m".into(),
            dims: 16,
            output_dims: 3,
            fill: 1.0,
        }));
        chain.push(constant("m", 16, 1.0)).unwrap();
        let (vec, position) = chain.embed_with_source("x", None).unwrap();
        assert_eq!(position, 1);
        assert_eq!(vec.len(), 16);
    }

    #[test]
    fn other_models_and_dimensions_are_rejected_at_push() {
        let mut chain = DegradationChain::new(constant("m", 16, 1.0));
        assert!(matches!(
            chain.push(constant("other", 16, 1.0)),
            Err(NoesisError::Embedding(EmbeddingError::ModelMismatch { .. }))
        ));
        assert!(matches!(
            chain.push(constant("m", 32, 1.0)),
            Err(NoesisError::Embedding(EmbeddingError::WrongDimensions { .. }))
        ));
        assert_eq!(chain.replica_count(), 0);
    }

    #[test]
    fn all_fail_returns_last_error() {
        let chain = DegradationChain::new(Arc::new(FailingProvider));
        let err = chain.embed("test", None).unwrap_err();
        assert!(matches!(err, NoesisError::Embedding(EmbeddingError::InferenceFailed { .. })));
    }

    #[test]
    fn batch_fallback() {
        let mut chain = DegradationChain::new(Arc::new(FailingProvider));
        chain.push(constant("m", 16, 1.0)).unwrap();
        let texts = vec!["a".to_string(), "b".to_string()];
        let vecs = chain.embed_batch(&texts).unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(chain.drain_events().len(), 1);
    }
}
