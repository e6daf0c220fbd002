use std::sync::Arc;

use dashmap::DashMap;

use crate::filter::Metadata;

/// One immutable indexed vector.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// A named set of entries sharing one dimensionality.
#[derive(Debug)]
pub(crate) struct Collection {
    pub(crate) dimensions: usize,
    pub(crate) entries: DashMap<String, Arc<IndexEntry>>,
}

impl Collection {
    pub(crate) fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: DashMap::new(),
        }
    }

    /// Point-in-time copy of the entry handles. Holds each shard's read lock
    /// only while cloning `Arc`s.
    pub(crate) fn snapshot(&self) -> Vec<Arc<IndexEntry>> {
        self.entries.iter().map(|e| Arc::clone(e.value())).collect()
    }
}
