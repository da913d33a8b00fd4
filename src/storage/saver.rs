//! Periodic catalog persistence.
//!
//! On every tick the saver asks the dispatcher for a snapshot. The dispatcher only
//! serializes when the catalog is dirty, clearing the flag as it does; when the
//! write then fails the saver re-arms the flag so the next tick retries.

use anyhow::Result;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SnapshotStore;
use crate::dispatch::{DispatchError, DispatcherHandle, DispatcherState};

/// Persist the catalog now if it is dirty (or `force`). Returns whether a snapshot was written.
pub async fn save_once(handle: &DispatcherHandle, store: &SnapshotStore, force: bool) -> Result<bool, DispatchError> {
    let Some(bytes) = handle.snapshot(force).await? else {
        return Ok(false);
    };
    match store.save(&bytes).await {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!("snapshot write failed, will retry: {}", e);
            handle.mark_dirty().await?;
            Ok(false)
        }
    }
}

/// Spawn the saver loop. It ends when the dispatcher closes.
pub fn spawn_saver(handle: DispatcherHandle, store: SnapshotStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut state = handle.subscribe();
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        info!("saver running every {}s -> {}", every.as_secs(), store.path().display());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match save_once(&handle, &store, false).await {
                        Ok(true) => debug!("periodic snapshot saved"),
                        Ok(false) => {}
                        Err(DispatchError::Closed) => break,
                    }
                }
                changed = state.changed() => {
                    if changed.is_err() || *state.borrow() == DispatcherState::Closed {
                        break;
                    }
                }
            }
        }
        debug!("saver stopped");
    })
}

/// Write the catalog returned by a stopped dispatcher when it still has unsaved changes.
pub async fn final_save(catalog: &crate::catalog::Catalog, store: &SnapshotStore) -> Result<bool> {
    if !catalog.is_dirty() {
        return Ok(false);
    }
    store.save(&catalog.save()?).await?;
    Ok(true)
}
