//! Relevance feedback.
//!
//! [`FeedbackProcessor`] turns one event into a bounded signal adjustment.
//! [`FeedbackQueue`] feeds it from an unbounded channel on a background task,
//! so submitting never blocks the caller and the effect is eventually
//! consistent. Events are deduplicated on `event_id`: re-delivery is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use noesis_core::config::FeedbackConfig;
use noesis_core::errors::{NoesisError, NoesisResult};
use noesis_core::fragment::SignalDelta;
use noesis_core::models::FeedbackEvent;
use noesis_episodic::EpisodicStore;
use noesis_observability::feedback_span;
use noesis_observability::tracing_setup::events;
use noesis_storage::KnowledgeStore;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What happened to a submitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Applied,
    /// The event id was seen before.
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackStats {
    pub applied: u64,
    pub duplicates: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    duplicates: AtomicU64,
    rejected: AtomicU64,
}

/// Applies feedback events to fragment signals and episode importance.
pub struct FeedbackProcessor {
    store: Arc<KnowledgeStore>,
    episodes: Option<Arc<EpisodicStore>>,
    config: FeedbackConfig,
    seen: DashSet<String>,
    counters: Counters,
}

impl FeedbackProcessor {
    pub fn new(store: Arc<KnowledgeStore>, config: FeedbackConfig) -> Self {
        Self {
            store,
            episodes: None,
            config,
            seen: DashSet::new(),
            counters: Counters::default(),
        }
    }

    pub fn with_episodes(mut self, episodes: Arc<EpisodicStore>) -> Self {
        self.episodes = Some(episodes);
        self
    }

    /// Signal adjustment for a relevance in [0, 1].
    ///
    /// 0.5 is neutral. Quality moves by up to `step` either way and
    /// authority by half that; recency is left to access tracking.
    pub fn signal_delta(&self, relevance: f64) -> SignalDelta {
        let direction = (relevance - 0.5) * 2.0;
        let quality = direction * self.config.step;
        SignalDelta::new(quality, 0.0, quality / 2.0).bounded(self.config.max_signal_delta)
    }

    /// Apply one event. An event that fails is forgotten, so a later
    /// re-delivery is retried rather than treated as a duplicate.
    pub fn apply(&self, event: &FeedbackEvent) -> NoesisResult<FeedbackOutcome> {
        let span = feedback_span!(event.event_id, event.fragment_id);
        let _entered = span.enter();

        if !event.relevance.is_finite() || !(0.0..=1.0).contains(&event.relevance) {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(NoesisError::invalid_fragment(
                &event.fragment_id,
                format!("feedback relevance {} outside [0, 1]", event.relevance),
            ));
        }
        if !self.seen.insert(event.event_id.clone()) {
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            debug!(event_id = %event.event_id, "duplicate feedback ignored");
            return Ok(FeedbackOutcome::Duplicate);
        }

        if let Err(e) = self.apply_new(event) {
            self.seen.remove(&event.event_id);
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
        self.counters.applied.fetch_add(1, Ordering::Relaxed);
        events::feedback_applied(&event.event_id, &event.fragment_id, event.relevance);
        Ok(FeedbackOutcome::Applied)
    }

    fn apply_new(&self, event: &FeedbackEvent) -> NoesisResult<()> {
        let delta = self.signal_delta(event.relevance);
        self.store.update_signals(&event.fragment_id, delta)?;
        self.store
            .record_feedback(&event.fragment_id, event.relevance)?;

        if let (Some(episodes), Some(episode_id)) = (&self.episodes, &event.episode_id) {
            // The fragment update stands even if the episode cannot be rescored.
            if let Err(e) = episodes.rescore(episode_id, event.relevance) {
                warn!(episode_id = %episode_id, error = %e, "episode rescore skipped");
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> FeedbackStats {
        FeedbackStats {
            applied: self.counters.applied.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}

enum Message {
    Event(FeedbackEvent),
    Flush(oneshot::Sender<()>),
}

/// Background feedback worker and its submission handle.
pub struct FeedbackQueue {
    sender: mpsc::UnboundedSender<Message>,
    processor: Arc<FeedbackProcessor>,
    worker: JoinHandle<()>,
}

impl FeedbackQueue {
    /// Spawn the worker on the current Tokio runtime.
    pub fn spawn(processor: Arc<FeedbackProcessor>) -> NoesisResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            NoesisError::Config(format!("feedback worker needs a tokio runtime: {e}"))
        })?;
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let worker_processor = Arc::clone(&processor);
        let worker = runtime.spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    Message::Event(event) => {
                        if let Err(e) = worker_processor.apply(&event) {
                            warn!(event_id = %event.event_id, error = %e, "feedback event rejected");
                        }
                    }
                    Message::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("feedback worker stopped");
        });
        Ok(Self {
            sender,
            processor,
            worker,
        })
    }

    /// Queue an event. If the worker is gone the event is applied inline.
    pub fn submit(&self, event: FeedbackEvent) {
        if let Err(mpsc::error::SendError(Message::Event(event))) =
            self.sender.send(Message::Event(event))
        {
            warn!(event_id = %event.event_id, "feedback worker gone, applying inline");
            if let Err(e) = self.processor.apply(&event) {
                warn!(event_id = %event.event_id, error = %e, "feedback event rejected");
            }
        }
    }

    /// Wait until every event submitted before this call has been processed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Message::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Drain the queue and stop the worker.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "feedback worker did not stop cleanly");
        }
    }

    pub fn processor(&self) -> &Arc<FeedbackProcessor> {
        &self.processor
    }

    pub fn stats(&self) -> FeedbackStats {
        self.processor.stats()
    }
}
