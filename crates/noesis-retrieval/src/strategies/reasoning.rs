use noesis_core::errors::NoesisResult;
use noesis_core::models::Strategy;
use tracing::debug;

use super::{semantic, Invocation};

/// Two semantic passes: the second one queries with the titles of the
/// first pass's best hits.
pub(super) fn run(inv: &Invocation) -> NoesisResult<()> {
    let ctx = &inv.ctx;
    let embedding = ctx.query_embedding()?;
    inv.checkpoint()?;

    let seeds = semantic::nearest(inv, &embedding, ctx.config.reasoning_seeds)?;
    if seeds.is_empty() {
        return Ok(());
    }
    let synthetic = seeds
        .iter()
        .map(|(fragment, _)| fragment.display_title())
        .collect::<Vec<_>>()
        .join(" ");
    for (fragment, evidence) in seeds {
        inv.add(fragment, Strategy::Reasoning, evidence);
    }
    inv.checkpoint()?;

    debug!(synthetic = %synthetic, "reasoning second pass");
    let second = ctx.embed(&synthetic)?;
    inv.checkpoint()?;
    for (fragment, evidence) in semantic::nearest(inv, &second, ctx.config.semantic_k)? {
        inv.add(fragment, Strategy::Reasoning, evidence);
    }
    Ok(())
}
