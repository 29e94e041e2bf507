//! Persistence writer background task

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that writes queued snapshots to the store.
///
/// Snapshots arrive on a watch channel, so a burst of mutations collapses
/// into one write of the newest state and an older snapshot can never land
/// after a newer one. Failures are logged and remembered on the state; the
/// in-memory engine is never rolled back.
pub async fn persistence_writer_task(state: Arc<AppState>) {
    info!("Starting persistence writer");

    let mut snapshot_rx = state.snapshot_tx.subscribe();

    loop {
        let snapshot = snapshot_rx.borrow_and_update().clone();
        let persisted = *state.persisted_tx.borrow();

        if snapshot.generation > persisted {
            let store = Arc::clone(&state.store);
            let record = snapshot.record;
            let outcome = match tokio::task::spawn_blocking(move || store.set(record)).await {
                Ok(Ok(())) => {
                    debug!("Persisted timer state generation {}", snapshot.generation);
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("Failed to persist timer state: {}", e);
                    Err(e.to_string())
                }
                Err(e) => {
                    error!("Persistence task failed: {}", e);
                    Err(e.to_string())
                }
            };
            state.set_persist_result(outcome);
            state.persisted_tx.send_replace(snapshot.generation);
        }

        if snapshot_rx.changed().await.is_err() {
            debug!("Snapshot channel closed, stopping writer");
            return;
        }
    }
}
