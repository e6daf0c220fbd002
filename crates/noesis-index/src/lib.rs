//! # noesis-index
//!
//! Vector index over named, disjoint collections. Entries are immutable
//! `Arc`s swapped atomically on upsert, so a concurrent search sees either the
//! old or the new vector, never a mix.

mod collection;
mod filter;
mod vector_index;

pub use collection::IndexEntry;
pub use filter::{Filter, Metadata, MetadataValue};
pub use vector_index::{SearchHit, VectorIndex};
