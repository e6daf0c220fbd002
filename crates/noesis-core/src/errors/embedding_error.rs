/// Embedding subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("provider {provider} returned {actual} dimensions, expected {expected}")]
    WrongDimensions {
        provider: String,
        expected: usize,
        actual: usize,
    },

    #[error("provider serves model {actual}, expected {expected}")]
    ModelMismatch { expected: String, actual: String },
}
