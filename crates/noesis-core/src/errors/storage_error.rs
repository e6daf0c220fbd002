/// Knowledge store errors that are not plain validation failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("fragment {id} is retired")]
    Retired { id: String },

    #[error("fragment {id} has a stale embedding from model {model}")]
    StaleEmbedding { id: String, model: String },

    #[error("signal delta {value:.3} for {signal} exceeds bound {bound:.3}")]
    DeltaOutOfBounds {
        signal: &'static str,
        value: f64,
        bound: f64,
    },
}
