use noesis_core::errors::NoesisResult;
use noesis_core::models::Strategy;
use tracing::debug;

use super::Invocation;

/// Fragments the user reached in past episodes that resemble the current
/// state and recent interactions.
///
/// Each fragment accessed in a matching episode is weighted by the
/// episode's importance times its similarity.
pub(super) fn run(inv: &Invocation) -> NoesisResult<()> {
    let ctx = &inv.ctx;
    let (Some(episodes), Some(user_id)) = (ctx.sources.episodes.as_ref(), ctx.user_id.as_deref())
    else {
        debug!("no episodic store or user, consciousness-pattern strategy skipped");
        return Ok(());
    };

    let summary = match episodes.recent_summary(user_id) {
        Some(summary) => format!("{summary} {}", ctx.query),
        None => ctx.query.clone(),
    };
    let embedding = episodes.embed_query(&summary, Some(&ctx.snapshot))?;
    inv.checkpoint()?;

    let matches = episodes.search_similar(user_id, &embedding, ctx.config.pattern_episodes_k)?;
    for (episode, similarity) in matches {
        inv.checkpoint()?;
        let weight = episode.importance * similarity.clamp(0.0, 1.0);
        for fragment_id in &episode.accessed_fragments {
            if let Some(fragment) = ctx.sources.store.eligible(fragment_id) {
                inv.add(fragment, Strategy::ConsciousnessPattern, weight);
            }
        }
    }
    Ok(())
}
