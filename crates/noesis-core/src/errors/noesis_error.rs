use super::{EmbeddingError, EpisodeError, IndexError, RetrievalError, StorageError};

/// Top-level error for every Noesis crate.
#[derive(Debug, thiserror::Error)]
pub enum NoesisError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid fragment {id}: {reason}")]
    InvalidFragment { id: String, reason: String },

    #[error("invalid ranking weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("strategy {strategy} exceeded its {budget_ms}ms budget")]
    StrategyTimeout { strategy: String, budget_ms: u64 },

    #[error("embedding provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("episode error: {0}")]
    Episode(#[from] EpisodeError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NoesisError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_fragment(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFragment {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the embedding provider could not serve the call.
    ///
    /// Retrieval treats these as a signal to fall back to lexical search.
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::Embedding(EmbeddingError::ProviderUnavailable { .. })
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type NoesisResult<T> = Result<T, NoesisError>;
