//! Host-side application state
//!
//! `AppState` is the single writer of the timing engine. Every operation
//! reads the clock, mutates the engine under one lock, then publishes the new
//! display view, the running flag and a persistence snapshot. The in-memory
//! engine is authoritative as soon as the lock is released; persistence runs
//! behind it on the writer task.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{engine::TimingEngine, view::TimerView};
use crate::{
    error::AppError,
    presets::PresetCatalog,
    storage::{decode_state, encode_state, Record, Store, STATE_KEYS},
    utils::Clock,
};

/// How long `flush` waits for the writer before giving up
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Record queued for the persistence writer
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Increases by one per mutation; zero means nothing to write yet
    pub generation: u64,
    pub record: Record,
}

/// Result of one host tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// True only when this tick finished a countdown; an operation landing
    /// first reports it instead
    pub finished: bool,
    pub view: TimerView,
}

/// Outcome of the completion check run before each access
#[derive(Debug, Clone, Copy)]
struct Completion {
    /// A running timer was stopped
    stopped: bool,
    /// The stop was a countdown reaching zero
    finished: bool,
}

pub struct AppState {
    engine: Mutex<TimingEngine>,
    clock: Arc<dyn Clock>,
    pub presets: PresetCatalog,
    pub store: Arc<dyn Store>,
    /// Server metadata
    pub start_time: Instant,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Most recent persistence failure, cleared by the next successful write
    last_persist_error: Mutex<Option<String>>,
    /// Latest snapshot to persist
    pub snapshot_tx: watch::Sender<Snapshot>,
    /// Generation of the latest snapshot the writer has attempted
    pub persisted_tx: watch::Sender<u64>,
    /// Display view after every change and tick
    pub view_tx: watch::Sender<TimerView>,
    /// Whether a running interval is open; drives the display ticker
    pub running_tx: watch::Sender<bool>,
}

impl AppState {
    /// Create state around an engine that is already reconciled
    pub fn new(
        engine: TimingEngine,
        clock: Arc<dyn Clock>,
        presets: PresetCatalog,
        store: Arc<dyn Store>,
    ) -> Self {
        let now = clock.now_epoch_ms();
        let view = TimerView::capture(&engine, now);
        let running = engine.state().running;
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        let (persisted_tx, _) = watch::channel(0);
        let (view_tx, _) = watch::channel(view);
        let (running_tx, _) = watch::channel(running);

        Self {
            engine: Mutex::new(engine),
            clock,
            presets,
            store,
            start_time: Instant::now(),
            last_action: Mutex::new(None),
            last_persist_error: Mutex::new(None),
            snapshot_tx,
            persisted_tx,
            view_tx,
            running_tx,
        }
    }

    /// Load the persisted snapshot and reconcile it against the clock.
    ///
    /// A failed read falls back to a fresh default state. If reconciling
    /// changed anything, the corrected state is queued for persistence.
    pub async fn load(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        presets: PresetCatalog,
    ) -> Self {
        let reader = Arc::clone(&store);
        let record = match tokio::task::spawn_blocking(move || reader.get(&STATE_KEYS)).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!("Failed to read persisted timer state, using defaults: {}", e);
                Record::new()
            }
            Err(e) => {
                warn!("Timer state read task failed, using defaults: {}", e);
                Record::new()
            }
        };

        let loaded = decode_state(&record);
        let mut engine = TimingEngine::from_state(loaded.clone());
        let now = clock.now_epoch_ms();
        if engine.reconcile(now) {
            info!("Countdown finished while closed");
        }
        let changed = *engine.state() != loaded;
        debug!(
            "Loaded timer: mode={}, running={}, display={}ms",
            engine.state().mode.as_str(),
            engine.state().running,
            engine.display_ms(now)
        );

        let state = Self::new(engine, clock, presets, store);
        if changed {
            state.queue_snapshot();
        }
        state
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TimingEngine>, AppError> {
        self.engine
            .lock()
            .map_err(|e| AppError::Lock(e.to_string()))
    }

    /// Apply `op` under the engine lock and publish the result.
    ///
    /// A countdown that reached zero since the last tick is finished first,
    /// so `op` never sees a running timer past its target. An operation that
    /// errors leaves the engine unchanged; only that completion is published.
    fn mutate<T, F>(&self, action: &str, op: F) -> Result<(T, TimerView), AppError>
    where
        F: FnOnce(&mut TimingEngine, i64) -> Result<T, AppError>,
    {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now_epoch_ms();
        let completion = self.settle(&mut engine, now);
        let value = match op(&mut *engine, now) {
            Ok(value) => value,
            Err(e) => {
                if completion.stopped {
                    self.publish(&engine, now);
                }
                return Err(e);
            }
        };
        let view = self.publish(&engine, now);
        drop(engine);

        self.record_action(action);
        debug!("{} -> {} ({:?})", action, view.display, view.status);
        Ok((value, view))
    }

    /// Completion check under the engine lock. `Finished` is logged and
    /// recorded here, on whichever access performs the transition.
    fn settle(&self, engine: &mut TimingEngine, now: i64) -> Completion {
        let was_running = engine.state().running;
        let finished = engine.poll(now);
        if finished {
            self.record_action("finished");
            info!("Countdown finished");
        }
        Completion {
            stopped: was_running && !engine.state().running,
            finished,
        }
    }

    /// Publish view, running flag and snapshot. Called with the engine locked
    /// so snapshots are generated in mutation order.
    fn publish(&self, engine: &TimingEngine, now: i64) -> TimerView {
        let view = TimerView::capture(engine, now);
        let record = encode_state(engine.state());
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.record = record;
        });
        let running = engine.state().running;
        self.running_tx.send_if_modified(|current| {
            let modified = *current != running;
            *current = running;
            modified
        });
        self.view_tx.send_replace(view.clone());
        view
    }

    /// Queue the current engine state for persistence without mutating it
    fn queue_snapshot(&self) {
        match self.lock_engine() {
            Ok(engine) => {
                let now = self.clock.now_epoch_ms();
                self.publish(&engine, now);
            }
            Err(e) => error!("Failed to queue timer snapshot: {}", e),
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    pub fn start(&self) -> Result<TimerView, AppError> {
        info!("Starting timer");
        self.mutate("start", |engine, now| engine.start(now).map_err(AppError::from))
            .map(|(_, view)| view)
    }

    pub fn pause(&self) -> Result<TimerView, AppError> {
        info!("Pausing timer");
        self.mutate("pause", |engine, now| {
            engine.pause(now);
            Ok(())
        })
        .map(|(_, view)| view)
    }

    pub fn reset(&self) -> Result<TimerView, AppError> {
        info!("Resetting timer");
        self.mutate("reset", |engine, _| {
            engine.reset();
            Ok(())
        })
        .map(|(_, view)| view)
    }

    /// Record a lap; returns the recorded value with the new view
    pub fn record_lap(&self) -> Result<(u64, TimerView), AppError> {
        let (lap, view) = self.mutate("lap", |engine, now| {
            if !engine.state().running {
                debug!("Lap recorded while paused");
            }
            Ok(engine.record_lap(now))
        })?;
        info!("Recorded lap {}ms", lap);
        Ok((lap, view))
    }

    pub fn clear_laps(&self) -> Result<TimerView, AppError> {
        info!("Clearing laps");
        self.mutate("clear-laps", |engine, _| {
            engine.clear_laps();
            Ok(())
        })
        .map(|(_, view)| view)
    }

    /// Select a preset from the catalog by id
    pub fn apply_preset(&self, preset_id: &str) -> Result<TimerView, AppError> {
        let preset = self
            .presets
            .get(preset_id)
            .ok_or_else(|| AppError::UnknownPreset(preset_id.to_string()))?;
        info!("Applying preset {} ({}ms)", preset.id, preset.duration_ms);
        self.mutate("preset", |engine, _| {
            engine.apply_preset(preset.id.clone(), preset.duration_ms);
            Ok(())
        })
        .map(|(_, view)| view)
    }

    pub fn toggle_mode(&self) -> Result<TimerView, AppError> {
        let (_, view) = self.mutate("toggle-mode", |engine, _| {
            engine.toggle_mode();
            Ok(())
        })?;
        info!("Mode switched to {}", view.mode.as_str());
        Ok(view)
    }

    /// Host tick: run the completion check and refresh the display view.
    ///
    /// Only a tick that finishes a countdown changes state and is persisted.
    pub fn poll(&self) -> Result<TickReport, AppError> {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now_epoch_ms();
        let completion = self.settle(&mut engine, now);

        let view = if completion.stopped {
            self.publish(&engine, now)
        } else {
            let view = TimerView::capture(&engine, now);
            self.view_tx.send_replace(view.clone());
            view
        };
        Ok(TickReport {
            finished: completion.finished,
            view,
        })
    }

    /// Current view. Changes state only to finish a countdown that reached
    /// zero since the last tick.
    pub fn view(&self) -> Result<TimerView, AppError> {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now_epoch_ms();
        if self.settle(&mut engine, now).stopped {
            return Ok(self.publish(&engine, now));
        }
        Ok(TimerView::capture(&engine, now))
    }

    pub fn is_running(&self) -> bool {
        *self.running_tx.borrow()
    }

    pub fn now_epoch_ms(&self) -> i64 {
        self.clock.now_epoch_ms()
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    pub fn last_persist_error(&self) -> Option<String> {
        self.last_persist_error.lock().ok().and_then(|e| e.clone())
    }

    /// Remember the outcome of a persistence attempt
    pub fn set_persist_result(&self, result: Result<(), String>) {
        if let Ok(mut last) = self.last_persist_error.lock() {
            *last = result.err();
        }
    }

    /// Wait until the writer has attempted the latest queued snapshot.
    ///
    /// Requires the persistence writer task to be running.
    pub async fn flush(&self) {
        let target = self.snapshot_tx.borrow().generation;
        if target == 0 {
            return;
        }
        let mut persisted_rx = self.persisted_tx.subscribe();
        let waited = tokio::time::timeout(
            FLUSH_TIMEOUT,
            persisted_rx.wait_for(|generation| *generation >= target),
        )
        .await
        .map(|reached| reached.map(|_| ()));
        match waited {
            Ok(Ok(_)) => debug!("Flushed timer state generation {}", target),
            Ok(Err(e)) => warn!("Persistence writer is gone, state may not be saved: {}", e),
            Err(_) => warn!("Timed out waiting for timer state to be saved"),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
