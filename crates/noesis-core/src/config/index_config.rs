use serde::{Deserialize, Serialize};

use super::defaults;

/// Vector index collection names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub documents_collection: String,
    pub episodes_collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            documents_collection: defaults::DEFAULT_DOCUMENTS_COLLECTION.to_string(),
            episodes_collection: defaults::DEFAULT_EPISODES_COLLECTION.to_string(),
        }
    }
}
