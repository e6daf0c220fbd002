//! Dimension checks shared by every component that accepts vectors.

use noesis_core::errors::{NoesisError, NoesisResult};

/// Validate that an embedding has the expected number of dimensions.
pub fn validate_dimensions(embedding: &[f32], expected: usize) -> NoesisResult<()> {
    if embedding.len() != expected {
        return Err(NoesisError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}
