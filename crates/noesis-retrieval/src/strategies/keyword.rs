use noesis_core::errors::NoesisResult;
use noesis_core::models::Strategy;

use super::Invocation;

/// Lexical token overlap against fragment content. Needs no embeddings.
pub(super) fn run(inv: &Invocation, tag: Strategy) -> NoesisResult<()> {
    let store = &inv.ctx.sources.store;
    for (id, overlap) in store.lexical_search(&inv.ctx.query, inv.ctx.config.keyword_k) {
        inv.checkpoint()?;
        if let Some(fragment) = store.eligible(&id) {
            inv.add(fragment, tag, overlap);
        }
    }
    Ok(())
}
