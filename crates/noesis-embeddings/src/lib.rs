//! # noesis-embeddings
//!
//! Embedding providers for the retrieval engine.
//!
//! - [`HashingProvider`]: deterministic feature-hashing provider that folds a
//!   state snapshot into a reserved tail of the vector. Always available.
//! - [`CachedProvider`]: moka-backed cache in front of any provider, keyed by a
//!   blake3 hash of the text and the state features.
//! - [`DegradationChain`]: ordered fallback across replicas of one model that
//!   records a `DegradationEvent` every time a replica stands in for the primary.

pub mod cache;
pub mod degradation;
pub mod dimensions;
pub mod providers;

pub use cache::{CachedProvider, L1MemoryCache};
pub use degradation::{DegradationChain, EMBEDDINGS_COMPONENT};
pub use dimensions::validate_dimensions;
pub use providers::HashingProvider;
