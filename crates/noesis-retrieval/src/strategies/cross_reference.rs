use noesis_core::errors::NoesisResult;
use noesis_core::models::Strategy;

use super::{semantic, Invocation};

/// Related fragments carry this share of their seed's evidence.
const RELATED_DISCOUNT: f64 = 0.8;

/// Semantic seeds expanded one hop through shared tags or domain.
pub(super) fn run(inv: &Invocation) -> NoesisResult<()> {
    let ctx = &inv.ctx;
    let embedding = ctx.query_embedding()?;
    inv.checkpoint()?;

    let seeds = semantic::nearest(inv, &embedding, ctx.config.cross_reference_seeds)?;
    for (seed, evidence) in seeds {
        inv.checkpoint()?;
        for related in ctx
            .sources
            .store
            .related(&seed, ctx.config.cross_reference_fan_out)
        {
            inv.add(related, Strategy::CrossReference, evidence * RELATED_DISCOUNT);
        }
        inv.add(seed, Strategy::CrossReference, evidence);
    }
    Ok(())
}
