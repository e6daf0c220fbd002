use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use noesis_core::errors::{IndexError, NoesisError, NoesisResult};
use noesis_core::similarity::{self, cosine_similarity};
use rayon::prelude::*;
use tracing::debug;

use crate::collection::{Collection, IndexEntry};
use crate::filter::{self, Filter, Metadata};

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    /// Cosine similarity in [-1, 1].
    pub similarity: f64,
    pub metadata: Metadata,
}

/// Concurrent in-memory vector index.
///
/// All methods take `&self`; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct VectorIndex {
    collections: DashMap<String, Arc<Collection>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection. Re-creating with the same dimensions is a no-op.
    pub fn create_collection(&self, name: &str, dimensions: usize) -> NoesisResult<()> {
        if let Some(existing) = self.collections.get(name) {
            if existing.dimensions == dimensions {
                return Ok(());
            }
            return Err(IndexError::CollectionExists {
                name: name.to_string(),
                dimensions: existing.dimensions,
            }
            .into());
        }
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(dimensions)));
        debug!(collection = name, dimensions, "collection created");
        Ok(())
    }

    /// Drop a collection and every entry in it. Returns whether it existed.
    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.remove(name).is_some()
    }

    pub fn dimensions(&self, collection: &str) -> NoesisResult<usize> {
        Ok(self.collection(collection)?.dimensions)
    }

    fn collection(&self, name: &str) -> NoesisResult<Arc<Collection>> {
        self.collections
            .get(name)
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| {
                IndexError::CollectionNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Insert or replace an entry.
    pub fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        metadata: Metadata,
    ) -> NoesisResult<()> {
        let coll = self.collection(collection)?;
        if vector.len() != coll.dimensions {
            return Err(NoesisError::DimensionMismatch {
                expected: coll.dimensions,
                actual: vector.len(),
            });
        }
        if !similarity::is_finite(&vector) {
            return Err(IndexError::NonFiniteVector { id: id.to_string() }.into());
        }
        let entry = Arc::new(IndexEntry {
            id: id.to_string(),
            vector,
            metadata,
        });
        coll.entries.insert(id.to_string(), entry);
        Ok(())
    }

    /// Remove an entry. Removing an absent id is not an error.
    pub fn remove(&self, collection: &str, id: &str) -> NoesisResult<bool> {
        Ok(self.collection(collection)?.entries.remove(id).is_some())
    }

    pub fn get(&self, collection: &str, id: &str) -> NoesisResult<Option<Arc<IndexEntry>>> {
        Ok(self
            .collection(collection)?
            .entries
            .get(id)
            .map(|e| Arc::clone(e.value())))
    }

    pub fn contains(&self, collection: &str, id: &str) -> NoesisResult<bool> {
        Ok(self.collection(collection)?.entries.contains_key(id))
    }

    pub fn len(&self, collection: &str) -> NoesisResult<usize> {
        Ok(self.collection(collection)?.entries.len())
    }

    pub fn is_empty(&self, collection: &str) -> NoesisResult<bool> {
        Ok(self.len(collection)? == 0)
    }

    /// Top-`k` entries by cosine similarity, restricted to entries matching
    /// every filter. Ties are broken by ascending id.
    pub fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        filters: &[Filter],
    ) -> NoesisResult<Vec<SearchHit>> {
        let coll = self.collection(collection)?;
        if query.len() != coll.dimensions {
            return Err(NoesisError::DimensionMismatch {
                expected: coll.dimensions,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = coll
            .snapshot()
            .par_iter()
            .filter(|entry| filter::matches_all(filters, &entry.metadata))
            .map(|entry| SearchHit {
                id: entry.id.clone(),
                similarity: cosine_similarity(query, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        debug!(collection, k, returned = hits.len(), "vector search");
        Ok(hits)
    }
}
