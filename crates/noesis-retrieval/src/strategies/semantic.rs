use std::sync::Arc;

use noesis_core::errors::NoesisResult;
use noesis_core::models::Strategy;
use noesis_core::similarity::rescale_unit;
use noesis_core::KnowledgeFragment;

use super::Invocation;

/// Nearest neighbours of the query embedding in the documents collection.
pub(super) fn run(inv: &Invocation) -> NoesisResult<()> {
    let embedding = inv.ctx.query_embedding()?;
    inv.checkpoint()?;
    for (fragment, evidence) in nearest(inv, &embedding, inv.ctx.config.semantic_k)? {
        inv.add(fragment, Strategy::Semantic, evidence);
    }
    Ok(())
}

/// Eligible fragments nearest to `embedding`, with rescaled similarity.
pub(super) fn nearest(
    inv: &Invocation,
    embedding: &[f32],
    k: usize,
) -> NoesisResult<Vec<(Arc<KnowledgeFragment>, f64)>> {
    let sources = &inv.ctx.sources;
    let hits = sources
        .index
        .search(&sources.documents_collection, embedding, k, &[])?;
    Ok(hits
        .into_iter()
        .filter_map(|hit| {
            sources
                .store
                .eligible(&hit.id)
                .map(|f| (f, rescale_unit(hit.similarity)))
        })
        .collect())
}
