//! Periodic upkeep: recency decay, episode importance decay, consolidation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use noesis_episodic::{ConsolidationReport, ImportanceDecayReport};
use noesis_observability::tracing_setup::events;
use noesis_observability::{consolidation_span, decay_span};
use noesis_storage::DecayReport;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::Orchestrator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    pub fragments: DecayReport,
    pub episodes: ImportanceDecayReport,
    /// `None` when another consolidation pass was already running.
    pub consolidation: Option<ConsolidationReport>,
}

impl Orchestrator {
    /// One maintenance pass up to `now`. Blocks; items are processed one at
    /// a time and per-item failures are skipped.
    pub fn run_maintenance(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let fragments = decay_span!("fragments", self.store.len()).in_scope(|| {
            self.store
                .decay(now, self.config.decay.recency_half_life_hours)
        });
        let episodes = decay_span!("episodes", self.episodes.len())
            .in_scope(|| self.episodes.decay_importance(now));
        let consolidation =
            consolidation_span!(self.episodes.len()).in_scope(|| match self.episodes.consolidate() {
                Ok(report) => {
                    events::consolidation_completed(
                        report.examined,
                        report.merges.len(),
                        report.skipped.len(),
                    );
                    Some(report)
                }
                Err(e) => {
                    warn!(error = %e, "consolidation skipped");
                    None
                }
            });
        MaintenanceReport {
            fragments,
            episodes,
            consolidation,
        }
    }

    /// Run maintenance every `decay.processing_interval_secs` on the blocking
    /// pool until shutdown. Must be called inside a Tokio runtime.
    pub fn spawn_maintenance(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let cancel = self.shutdown.child_token();
        let period = Duration::from_secs(self.config.decay.processing_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let pass = Arc::clone(&this);
                        match tokio::task::spawn_blocking(move || pass.run_maintenance(Utc::now())).await {
                            Ok(report) => debug!(
                                fragments = report.fragments.processed,
                                episodes = report.episodes.processed,
                                "maintenance pass complete"
                            ),
                            Err(e) => warn!(error = %e, "maintenance pass did not finish"),
                        }
                    }
                }
            }
            debug!("maintenance loop stopped");
        })
    }
}
