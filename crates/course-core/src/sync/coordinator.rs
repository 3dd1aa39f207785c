//! Single-flight run guard and last-run bookkeeping

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the coordinator for status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub running: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
}

/// Shared run state: at most one run holds the guard at a time.
///
/// One coordinator is shared (via `Arc`) by every orchestrator that must not
/// run concurrently with the others.
#[derive(Debug, Default)]
pub struct SyncCoordinator {
    running: AtomicBool,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot, or `None` when a run is already in progress.
    pub fn try_acquire(&self) -> Option<SyncGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard { coordinator: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            running: self.is_running(),
            last_sync_time: self.last_sync_time(),
        }
    }
}

/// Held for the duration of a run. Dropping it releases the run slot.
#[derive(Debug)]
pub struct SyncGuard<'a> {
    coordinator: &'a SyncCoordinator,
}

impl SyncGuard<'_> {
    /// Record `at` as the last sync time and release the slot.
    pub fn complete(self, at: DateTime<Utc>) {
        *self
            .coordinator
            .last_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(at);
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.running.store(false, Ordering::Release);
    }
}
