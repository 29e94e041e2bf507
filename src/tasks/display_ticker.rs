//! Display ticker background task

use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Default interval between display refreshes while running
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Background task that refreshes the display while the timer runs.
///
/// Sleeps on the running flag while paused; no ticks are scheduled until a
/// running interval opens. Each tick runs the countdown completion check.
pub async fn display_ticker_task(state: Arc<AppState>, tick: Duration) {
    info!("Starting display ticker ({}ms)", tick.as_millis());

    let mut running_rx = state.running_tx.subscribe();

    loop {
        // Wait until a running interval is open
        if running_rx.wait_for(|running| *running).await.is_err() {
            debug!("Running flag channel closed, stopping ticker");
            return;
        }
        debug!("Timer running, ticking");

        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.poll() {
                        Ok(report) if report.finished => {
                            info!("Countdown reached {}", report.view.display);
                        }
                        Ok(_) => {}
                        Err(e) => error!("Display tick failed: {}", e),
                    }
                }
                changed = running_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }

            if !*running_rx.borrow() {
                debug!("Timer stopped, ticker idle");
                break;
            }
        }
    }
}
