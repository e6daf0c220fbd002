//! Shared per-request state handed to every strategy.

use std::sync::{Arc, OnceLock};

use noesis_core::config::RetrievalConfig;
use noesis_core::errors::{EmbeddingError, NoesisError, NoesisResult};
use noesis_core::models::{QueryContext, StateSnapshot};
use noesis_core::traits::IEmbeddingProvider;
use noesis_episodic::EpisodicStore;
use noesis_index::VectorIndex;
use noesis_storage::KnowledgeStore;

/// The stores and provider strategies read from.
#[derive(Clone)]
pub struct RetrievalSources {
    pub store: Arc<KnowledgeStore>,
    pub index: Arc<VectorIndex>,
    /// Without an episodic store the consciousness-pattern strategy finds nothing.
    pub episodes: Option<Arc<EpisodicStore>>,
    pub provider: Arc<dyn IEmbeddingProvider>,
    pub documents_collection: String,
}

impl RetrievalSources {
    pub fn new(
        store: Arc<KnowledgeStore>,
        index: Arc<VectorIndex>,
        provider: Arc<dyn IEmbeddingProvider>,
        documents_collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index,
            episodes: None,
            provider,
            documents_collection: documents_collection.into(),
        }
    }

    pub fn with_episodes(mut self, episodes: Arc<EpisodicStore>) -> Self {
        self.episodes = Some(episodes);
        self
    }
}

#[derive(Debug, Clone)]
enum EmbedFailure {
    Unavailable(String),
    Failed(String),
}

impl EmbedFailure {
    fn from_error(err: &NoesisError, provider: &str) -> Self {
        if err.is_provider_unavailable() {
            Self::Unavailable(provider.to_string())
        } else {
            Self::Failed(err.to_string())
        }
    }

    fn to_error(&self) -> NoesisError {
        match self {
            Self::Unavailable(provider) => NoesisError::ProviderUnavailable {
                provider: provider.clone(),
            },
            Self::Failed(reason) => EmbeddingError::InferenceFailed {
                reason: reason.clone(),
            }
            .into(),
        }
    }
}

/// Read-only view of one request, shared by its strategies.
pub struct StrategyContext {
    pub sources: RetrievalSources,
    pub config: RetrievalConfig,
    /// The caller's query text, used for lexical matching.
    pub query: String,
    /// The enhanced query when present; what gets embedded.
    pub embedding_text: String,
    pub snapshot: StateSnapshot,
    pub user_id: Option<String>,
    query_embedding: OnceLock<Result<Arc<Vec<f32>>, EmbedFailure>>,
}

impl StrategyContext {
    pub fn new(sources: RetrievalSources, config: RetrievalConfig, query: &QueryContext) -> Self {
        Self {
            sources,
            config,
            query: query.query.clone(),
            embedding_text: query.effective_query().to_string(),
            snapshot: query.snapshot.clone(),
            user_id: query.user_id().map(str::to_string),
            query_embedding: OnceLock::new(),
        }
    }

    /// The state-contextualized query embedding, computed once per request.
    ///
    /// A failure is remembered too, so the provider is asked at most once.
    pub fn query_embedding(&self) -> NoesisResult<Arc<Vec<f32>>> {
        self.query_embedding
            .get_or_init(|| {
                self.sources
                    .provider
                    .embed(&self.embedding_text, Some(&self.snapshot))
                    .map(Arc::new)
                    .map_err(|e| EmbedFailure::from_error(&e, self.sources.provider.model_id()))
            })
            .clone()
            .map_err(|f| f.to_error())
    }

    /// The query embedding if some strategy already computed it.
    pub fn cached_query_embedding(&self) -> Option<Arc<Vec<f32>>> {
        self.query_embedding.get().and_then(|r| r.as_ref().ok().cloned())
    }

    /// Embed arbitrary text with this request's snapshot.
    pub fn embed(&self, text: &str) -> NoesisResult<Vec<f32>> {
        self.sources.provider.embed(text, Some(&self.snapshot))
    }
}
