//! RetrievalEngine: runs the requested strategies concurrently, each under
//! its own deadline, and merges what they found.
//!
//! Strategies run on the blocking pool. A strategy that misses its deadline
//! is cancelled through its token and abandoned; whatever it pushed into its
//! sink before that still counts. Cancelling the request cancels every
//! strategy and discards all partial work.
//!
//! When the plan has no keyword pass of its own, a standby keyword pass runs
//! alongside it under the full budget. Its results are used only if no
//! requested strategy completes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use noesis_core::config::RetrievalConfig;
use noesis_core::errors::{NoesisError, NoesisResult, RetrievalError};
use noesis_core::models::{QueryContext, Strategy, StrategyReport, StrategyStatus};
use noesis_core::CancellationToken;
use tracing::{debug, info, warn};

use crate::budget::{self, Allotment};
use crate::search::{Candidate, CandidatePool, RetrievalSources, StrategyContext};
use crate::strategies::{self, Invocation};

/// Unranked result of one request.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Merged by fragment id, ordered by id.
    pub candidates: Vec<Candidate>,
    /// One report per distinct strategy, in request order.
    pub reports: Vec<StrategyReport>,
    pub degraded: bool,
    /// The query embedding, when a strategy computed it.
    pub query_embedding: Option<Arc<Vec<f32>>>,
}

struct StrategyRun {
    report: StrategyReport,
    pool: CandidatePool,
    degraded: bool,
}

/// Concurrent strategy runner.
pub struct RetrievalEngine {
    sources: RetrievalSources,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(sources: RetrievalSources, config: RetrievalConfig) -> Self {
        Self { sources, config }
    }

    pub fn sources(&self) -> &RetrievalSources {
        &self.sources
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The strategies a request will run, with their budgets.
    pub fn plan(&self, query: &QueryContext) -> NoesisResult<Vec<Allotment>> {
        let requested = if query.strategies.is_empty() {
            &self.config.default_strategies
        } else {
            &query.strategies
        };
        budget::allot(requested, query.strategy_weights.as_ref(), query.timeout)
    }

    /// Run every planned strategy and merge their candidates.
    ///
    /// Never waits past `query.timeout`. Returns `Cancelled` if the query's
    /// token fires before the merge.
    pub async fn retrieve(&self, query: &QueryContext) -> NoesisResult<RetrievalOutcome> {
        let plan = self.plan(query)?;
        if query.is_cancelled() {
            return Err(NoesisError::Cancelled);
        }

        let request_token = query.cancel.child_token();
        let ctx = Arc::new(StrategyContext::new(
            self.sources.clone(),
            self.config.clone(),
            query,
        ));

        let runs = plan.iter().map(|allotment| {
            run_strategy(*allotment, Arc::clone(&ctx), request_token.child_token())
        });
        let standby = async {
            if plan.iter().any(|a| a.strategy == Strategy::Keyword) {
                return None;
            }
            let allotment = Allotment {
                strategy: Strategy::Keyword,
                budget: query.timeout,
            };
            Some(run_strategy(allotment, Arc::clone(&ctx), request_token.child_token()).await)
        };
        let (finished, standby) = tokio::join!(join_all(runs), standby);
        request_token.cancel();

        if query.is_cancelled() {
            info!(query = %query.query, "retrieval cancelled, partial work discarded");
            return Err(NoesisError::Cancelled);
        }

        let mut merged = CandidatePool::new();
        let mut reports = Vec::with_capacity(finished.len());
        let mut degraded = false;
        let any_completed = finished.iter().any(|run| run.report.status.is_success());
        for run in finished {
            degraded |= run.degraded || !run.report.status.is_success();
            merged.merge(run.pool);
            reports.push(run.report);
        }
        if let Some(mut fallback) = standby.filter(|_| !any_completed) {
            warn!(
                found = fallback.pool.len(),
                "no requested strategy completed, using keyword fallback"
            );
            fallback.report.fallback = true;
            merged.merge(fallback.pool);
            reports.push(fallback.report);
        }
        let store = &self.sources.store;
        merged.refresh(|id| store.eligible(id));

        info!(
            strategies = reports.len(),
            candidates = merged.len(),
            degraded,
            "retrieval complete"
        );
        Ok(RetrievalOutcome {
            candidates: merged.into_candidates(),
            reports,
            degraded,
            query_embedding: ctx.cached_query_embedding(),
        })
    }
}

async fn run_strategy(
    allotment: Allotment,
    ctx: Arc<StrategyContext>,
    cancel: CancellationToken,
) -> StrategyRun {
    let Allotment { strategy, budget } = allotment;
    let invocation = Invocation::new(strategy, ctx, cancel.clone());
    let sink = invocation.sink.clone();
    let started = Instant::now();

    let handle = tokio::task::spawn_blocking(move || strategies::execute(&invocation));
    let (status, degraded) = tokio::select! {
        joined = tokio::time::timeout(budget, handle) => match joined {
            Ok(Ok(Ok(completion))) => (StrategyStatus::Completed, completion.degraded),
            Ok(Ok(Err(NoesisError::Cancelled))) => (StrategyStatus::Cancelled, false),
            Ok(Ok(Err(e))) => {
                warn!(%strategy, error = %e, "strategy failed");
                (StrategyStatus::Failed { reason: e.to_string() }, false)
            }
            Ok(Err(join_err)) => {
                let e = RetrievalError::TaskPanicked { reason: join_err.to_string() };
                warn!(%strategy, error = %e, "strategy task did not finish");
                (StrategyStatus::Failed { reason: e.to_string() }, false)
            }
            Err(_) => {
                cancel.cancel();
                let e = NoesisError::StrategyTimeout {
                    strategy: strategy.to_string(),
                    budget_ms: millis(budget),
                };
                warn!(%strategy, error = %e, partial = sink.len(), "strategy timed out");
                (StrategyStatus::TimedOut, false)
            }
        },
        _ = cancel.cancelled() => (StrategyStatus::Cancelled, false),
    };

    let pool = sink.take();
    let elapsed = started.elapsed();
    debug!(%strategy, ?status, found = pool.len(), elapsed_ms = millis(elapsed), "strategy finished");
    StrategyRun {
        report: StrategyReport {
            strategy,
            status,
            candidates: pool.len(),
            budget_ms: millis(budget),
            elapsed_ms: millis(elapsed),
            fallback: degraded,
        },
        pool,
        degraded,
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
