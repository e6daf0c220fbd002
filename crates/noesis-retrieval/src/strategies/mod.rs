//! The six retrieval strategies.
//!
//! Each strategy runs synchronously on the blocking pool and pushes what it
//! finds into its own [`CandidateSink`] as it goes, so a strategy stopped by
//! its deadline still leaves partial results behind. Strategies poll their
//! cancellation token between steps.

mod cross_reference;
mod hybrid;
mod keyword;
mod pattern;
mod reasoning;
mod semantic;

use std::sync::Arc;

use noesis_core::errors::{NoesisError, NoesisResult};
use noesis_core::models::Strategy;
use noesis_core::{CancellationToken, KnowledgeFragment};
use tracing::{debug, warn};

use crate::search::{CandidateSink, StrategyContext};

/// One strategy execution within one request.
pub struct Invocation {
    pub strategy: Strategy,
    pub ctx: Arc<StrategyContext>,
    pub sink: CandidateSink,
    pub cancel: CancellationToken,
}

impl Invocation {
    pub fn new(strategy: Strategy, ctx: Arc<StrategyContext>, cancel: CancellationToken) -> Self {
        Self {
            strategy,
            ctx,
            sink: CandidateSink::default(),
            cancel,
        }
    }

    fn checkpoint(&self) -> NoesisResult<()> {
        if self.cancel.is_cancelled() {
            Err(NoesisError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn add(&self, fragment: Arc<KnowledgeFragment>, tag: Strategy, evidence: f64) {
        self.sink.add(fragment, tag, evidence);
    }
}

/// How a strategy finished when it did not return an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    /// Results came (partly) from the keyword path because the embedding
    /// provider could not serve the request.
    pub degraded: bool,
}

/// Run `inv.strategy`, falling back to keyword search when a strategy that
/// needs embeddings loses the provider.
pub fn execute(inv: &Invocation) -> NoesisResult<Completion> {
    inv.checkpoint()?;
    let result = match inv.strategy {
        Strategy::Semantic => semantic::run(inv),
        Strategy::Keyword => keyword::run(inv, Strategy::Keyword),
        Strategy::Hybrid => return hybrid::run(inv),
        Strategy::ConsciousnessPattern => pattern::run(inv),
        Strategy::CrossReference => cross_reference::run(inv),
        Strategy::Reasoning => reasoning::run(inv),
    };
    match result {
        Ok(()) => {
            debug!(strategy = %inv.strategy, found = inv.sink.len(), "strategy completed");
            Ok(Completion::default())
        }
        Err(e) if e.is_provider_unavailable() && inv.strategy.requires_embedding() => {
            warn!(
                strategy = %inv.strategy,
                error = %e,
                "embedding provider unavailable, falling back to keyword search"
            );
            inv.checkpoint()?;
            keyword::run(inv, Strategy::Keyword)?;
            Ok(Completion { degraded: true })
        }
        Err(e) => Err(e),
    }
}
