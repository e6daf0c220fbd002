/// Vector index errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("collection {name} already exists with {dimensions} dimensions")]
    CollectionExists { name: String, dimensions: usize },

    #[error("vector for {id} contains non-finite values")]
    NonFiniteVector { id: String },
}
