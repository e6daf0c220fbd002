use noesis_core::errors::{NoesisError, NoesisResult};
use noesis_core::models::Strategy;
use tracing::warn;

use super::{keyword, semantic, Completion, Invocation};

/// Keyword and semantic halves under one tag. The keyword half runs first;
/// a failing semantic half keeps it and degrades the response.
pub(super) fn run(inv: &Invocation) -> NoesisResult<Completion> {
    keyword::run(inv, Strategy::Hybrid)?;
    inv.checkpoint()?;

    let semantic_half = inv.ctx.query_embedding().and_then(|embedding| {
        inv.checkpoint()?;
        semantic::nearest(inv, &embedding, inv.ctx.config.semantic_k)
    });
    match semantic_half {
        Ok(hits) => {
            for (fragment, evidence) in hits {
                inv.add(fragment, Strategy::Hybrid, evidence);
            }
            Ok(Completion::default())
        }
        Err(NoesisError::Cancelled) => Err(NoesisError::Cancelled),
        Err(e) => {
            warn!(error = %e, kept = inv.sink.len(), "hybrid semantic half failed, keeping keyword results");
            Ok(Completion { degraded: true })
        }
    }
}
