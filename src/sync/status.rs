//! Observable sync status and device connectivity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Serialize;

/// What the sync indicator shows.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Success,
    Error,
}

#[derive(Debug, Default)]
struct StatusState {
    status: SyncStatus,
    generation: u64,
}

/// Sync status guarded by a generation counter.
///
/// Every transition bumps the generation. A delayed reset carries the generation it was
/// scheduled under and is dropped if anything has transitioned since.
#[derive(Debug, Default)]
pub struct StatusCell {
    state: Mutex<StatusState>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> SyncStatus {
        self.lock().status
    }

    /// Move to `status` and return the new generation.
    pub fn transition(&self, status: SyncStatus) -> u64 {
        let mut state = self.lock();
        state.status = status;
        state.generation += 1;
        tracing::debug!(?status, generation = state.generation, "Sync status changed");
        state.generation
    }

    /// Reset to idle if no transition happened after `generation`. Returns whether it applied.
    pub fn reset_if_current(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                stale = generation,
                current = state.generation,
                "Dropping stale sync status reset"
            );
            return false;
        }
        state.status = SyncStatus::Idle;
        state.generation += 1;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatusState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Whether the device currently reports network connectivity.
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!(online, "Connectivity changed");
        }
        previous
    }
}
