//! Shared fixtures for Noesis tests: builders, deterministic providers and the
//! JSON corpus under `data/`.

mod builders;
mod providers;

pub use builders::{episode, snapshot, user, FragmentBuilder};
pub use providers::{FakeProvider, SlowProvider};

use std::path::PathBuf;

use noesis_core::traits::IEmbeddingProvider;
use noesis_core::KnowledgeFragment;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Dimensions used by [`FakeProvider::standard`] and the corpus loader.
pub const TEST_DIMENSIONS: usize = 32;

fn data_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = data_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// One entry of `data/corpus.json`. Embeddings are computed at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub domain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `[min_level, optimal_low, optimal_high]`
    pub window: [f64; 3],
    pub complexity: f64,
    pub authority: f64,
    pub quality: f64,
    #[serde(default)]
    pub populations: Vec<(String, f64)>,
}

/// Load the shared corpus and embed each entry with `provider`.
pub fn load_corpus(provider: &dyn IEmbeddingProvider) -> Vec<KnowledgeFragment> {
    let entries: Vec<CorpusEntry> = load_fixture("corpus.json");
    entries
        .into_iter()
        .map(|e| {
            let mut b = FragmentBuilder::new(&e.id, &e.content)
                .title(&e.title)
                .domain(&e.domain)
                .window(e.window[0], e.window[1], e.window[2])
                .complexity(e.complexity)
                .authority(e.authority)
                .quality(e.quality);
            for tag in &e.tags {
                b = b.tag(tag);
            }
            for (population, weight) in &e.populations {
                b = b.affinity(population, *weight);
            }
            b.embed_with(provider)
        })
        .collect()
}
