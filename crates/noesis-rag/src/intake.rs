//! State snapshot intake from the event transport.
//!
//! Delivery is at-least-once, so re-delivered and out-of-order snapshots
//! must be harmless: only a strictly newer version replaces the current one.

use std::sync::{PoisonError, RwLock};

use noesis_core::models::StateSnapshot;
use noesis_observability::tracing_setup::events;
use tracing::debug;

#[derive(Debug, Default)]
pub struct StateIntake {
    current: RwLock<Option<StateSnapshot>>,
}

impl StateIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `snapshot` if its version is newer than the current one.
    /// Returns whether it was accepted.
    pub fn offer(&self, snapshot: StateSnapshot) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = current.as_ref() {
            if snapshot.version <= existing.version {
                debug!(
                    offered = snapshot.version,
                    current = existing.version,
                    "stale or repeated snapshot ignored"
                );
                return false;
            }
        }
        events::snapshot_accepted(snapshot.version, snapshot.level);
        *current = Some(snapshot);
        true
    }

    pub fn current(&self) -> Option<StateSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn version(&self) -> Option<u64> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newer_versions_replace() {
        let intake = StateIntake::new();
        assert!(intake.offer(StateSnapshot::new(2, 0.4)));
        assert!(!intake.offer(StateSnapshot::new(2, 0.9)));
        assert!(!intake.offer(StateSnapshot::new(1, 0.9)));
        assert_eq!(intake.current().map(|s| s.level), Some(0.4));
        assert!(intake.offer(StateSnapshot::new(3, 0.9)));
        assert_eq!(intake.version(), Some(3));
    }
}
