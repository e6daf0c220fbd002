use crate::errors::NoesisResult;
use crate::models::StateSnapshot;

/// Embedding generation provider.
///
/// Must be deterministic for identical inputs within one `model_id`.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text, optionally contextualized by a state snapshot.
    fn embed(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>>;

    /// Embed a batch of texts without state context.
    fn embed_batch(&self, texts: &[String]) -> NoesisResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t, None)).collect()
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identifier of the model version; embeddings from different ids are not comparable.
    fn model_id(&self) -> &str;

    /// Whether the provider folds state snapshots into its embeddings.
    fn supports_state_context(&self) -> bool {
        false
    }

    /// Whether this provider is currently available.
    fn is_available(&self) -> bool;
}
