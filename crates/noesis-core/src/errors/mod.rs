mod embedding_error;
mod episode_error;
mod index_error;
mod noesis_error;
mod retrieval_error;
mod storage_error;

pub use embedding_error::EmbeddingError;
pub use episode_error::EpisodeError;
pub use index_error::IndexError;
pub use noesis_error::{NoesisError, NoesisResult};
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;
