use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    InProgress,
    Complete,
    Cancelled,
}

impl MigrationStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Pending,
            1 => Self::InProgress,
            2 => Self::Complete,
            _ => Self::Cancelled,
        }
    }
}

/// Lock-free progress counters, readable while the worker runs.
#[derive(Debug)]
pub struct MigrationProgress {
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    status: AtomicU8,
    started_at: OnceLock<Instant>,
}

impl Default for MigrationProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MigrationProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            status: AtomicU8::new(0),
            started_at: OnceLock::new(),
        }
    }

    pub fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.status.store(1, Ordering::Relaxed);
        let _ = self.started_at.set(Instant::now());
    }

    pub fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_complete(&self) {
        self.status.store(2, Ordering::Relaxed);
    }

    pub fn mark_cancelled(&self) {
        self.status.store(3, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let remaining = total.saturating_sub(completed).saturating_sub(failed);

        let eta_seconds = self.started_at.get().and_then(|start| {
            let elapsed = start.elapsed().as_secs_f64();
            if completed == 0 || elapsed <= 0.0 {
                return None;
            }
            let rate = completed as f64 / elapsed;
            Some((remaining as f64 / rate) as u64)
        });

        ProgressSnapshot {
            total,
            completed,
            failed,
            remaining,
            status: MigrationStatus::from_u8(self.status.load(Ordering::Relaxed)),
            eta_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub remaining: u64,
    pub status: MigrationStatus,
    pub eta_seconds: Option<u64>,
}
