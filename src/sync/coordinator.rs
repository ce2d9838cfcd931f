//! Sync coordinator bridging the local store and the sheet endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use super::{Connectivity, SheetsClient, StatusCell, SyncStatus};
use crate::config::Config;
use crate::db::LocalStore;

/// Timing and connectivity knobs for the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub start_online: bool,
    pub reset_delay: Duration,
    pub auto_sync_delay: Duration,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            start_online: config.start_online,
            reset_delay: config.sync_reset_delay,
            auto_sync_delay: config.auto_sync_delay,
        }
    }
}

/// What a single sync invocation did.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Device offline; nothing attempted and status untouched
    Offline,
    /// Another push is in flight; nothing attempted
    AlreadySyncing,
    /// No unsynced entries; no network call made
    NothingToSync,
    /// Batch acknowledged
    Pushed { sent: usize, marked: usize },
    /// Batch rejected or transport failed; no entry changed
    Failed,
}

/// Pushes unsynced entries and tracks the sync status.
pub struct SyncCoordinator {
    store: Arc<LocalStore>,
    sheets: SheetsClient,
    connectivity: Connectivity,
    status: Arc<StatusCell>,
    push_lock: AsyncMutex<()>,
    settings: SyncSettings,
}

impl SyncCoordinator {
    pub fn new(store: Arc<LocalStore>, sheets: SheetsClient, settings: SyncSettings) -> Self {
        Self {
            store,
            sheets,
            connectivity: Connectivity::new(settings.start_online),
            status: Arc::new(StatusCell::new()),
            push_lock: AsyncMutex::new(()),
            settings,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.get()
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn sheets(&self) -> &SheetsClient {
        &self.sheets
    }

    /// Push every unsynced entry as one batch.
    ///
    /// Only the entries captured before the push are marked synced on success, so entries
    /// recorded while the request is in flight stay unsynced for the next attempt.
    pub async fn sync(&self) -> SyncOutcome {
        if !self.connectivity.is_online() {
            tracing::info!("Cannot sync while offline");
            return SyncOutcome::Offline;
        }

        let Ok(push) = self.push_lock.try_lock() else {
            tracing::debug!("Sync already in flight");
            return SyncOutcome::AlreadySyncing;
        };

        self.push_unsynced(push).await
    }

    /// Like `sync`, but waits for a push already in flight and then runs its own, so entries
    /// recorded during that push still go out.
    async fn sync_after_in_flight(&self) -> SyncOutcome {
        if !self.connectivity.is_online() {
            return SyncOutcome::Offline;
        }

        let push = self.push_lock.lock().await;
        if !self.connectivity.is_online() {
            tracing::info!("Went offline while waiting to sync");
            return SyncOutcome::Offline;
        }

        self.push_unsynced(push).await
    }

    /// Capture, push and mark one batch. Holding `_push` keeps other pushes out.
    async fn push_unsynced(&self, _push: AsyncMutexGuard<'_, ()>) -> SyncOutcome {
        let batch = match self.store.capture_unsynced().await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!("Could not read unsynced entries: {}", e);
                self.finish(SyncStatus::Error);
                return SyncOutcome::Failed;
            }
        };

        if batch.is_empty() {
            self.finish(SyncStatus::Success);
            return SyncOutcome::NothingToSync;
        }

        self.status.transition(SyncStatus::Syncing);

        if let Err(e) = self.sheets.push(&batch.entries).await {
            tracing::warn!("Sync failed: {}", e);
            self.finish(SyncStatus::Error);
            return SyncOutcome::Failed;
        }

        match self.store.mark_synced(&batch.slots).await {
            Ok(marked) => {
                tracing::info!(sent = batch.len(), marked, "Sync succeeded");
                self.finish(SyncStatus::Success);
                SyncOutcome::Pushed {
                    sent: batch.len(),
                    marked,
                }
            }
            Err(e) => {
                tracing::error!("Batch acknowledged but marking entries failed: {}", e);
                self.finish(SyncStatus::Error);
                SyncOutcome::Failed
            }
        }
    }

    /// Run one sync shortly after a new entry is recorded, if the device is online.
    pub fn schedule_auto_sync(self: &Arc<Self>) {
        if !self.connectivity.is_online() {
            return;
        }

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(coordinator.settings.auto_sync_delay).await;
            let outcome = coordinator.sync_after_in_flight().await;
            tracing::debug!(?outcome, "Automatic sync finished");
        });
    }

    /// Enter a terminal status and arm the reset back to idle.
    fn finish(&self, status: SyncStatus) {
        let generation = self.status.transition(status);
        let cell = Arc::clone(&self.status);
        let delay = self.settings.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            cell.reset_if_current(generation);
        });
    }
}
