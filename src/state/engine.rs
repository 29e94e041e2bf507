//! Timing engine: every operation on the timer state
//!
//! The engine never reads a clock. Callers pass the wall-clock instant and the
//! display value is recomputed from timestamps on demand, so time spent while
//! no process was alive is accounted for on the next call.

use serde::{Deserialize, Serialize};

use super::timer_state::{Mode, TimerState};
use crate::error::EngineError;

/// Externally visible run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    /// Countdown only: stopped because remaining time reached zero
    Finished,
}

/// Display value for `state` at `now_epoch_ms`: elapsed time in stopwatch
/// mode, remaining time (clamped at zero) in countdown mode.
pub fn compute_display_ms(state: &TimerState, now_epoch_ms: i64) -> u64 {
    let elapsed = state.elapsed_ms(now_epoch_ms);
    match state.mode {
        Mode::Stopwatch => elapsed,
        Mode::Countdown => state.target_duration_ms.saturating_sub(elapsed),
    }
}

/// Owner of the single timer instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingEngine {
    state: TimerState,
}

impl TimingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a previously persisted state. Call `reconcile` before use.
    pub fn from_state(state: TimerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn into_state(self) -> TimerState {
        self.state
    }

    pub fn display_ms(&self, now_epoch_ms: i64) -> u64 {
        compute_display_ms(&self.state, now_epoch_ms)
    }

    pub fn status(&self, now_epoch_ms: i64) -> RunStatus {
        if self.state.running {
            RunStatus::Running
        } else if self.countdown_reached(now_epoch_ms) {
            RunStatus::Finished
        } else {
            RunStatus::Idle
        }
    }

    /// Open a running interval at `now_epoch_ms`. No-op while running.
    pub fn start(&mut self, now_epoch_ms: i64) -> Result<(), EngineError> {
        if self.state.running {
            return Ok(());
        }
        if self.state.mode == Mode::Countdown {
            if self.state.target_duration_ms == 0 {
                return Err(EngineError::PresetRequired);
            }
            if self.countdown_reached(now_epoch_ms) {
                return Err(EngineError::CountdownFinished);
            }
        }
        self.state.running = true;
        self.state.interval_start_epoch_ms = Some(now_epoch_ms);
        Ok(())
    }

    /// Fold the open interval into the accumulator. No-op while paused.
    pub fn pause(&mut self, now_epoch_ms: i64) {
        if !self.state.running {
            return;
        }
        let interval = self.state.open_interval_ms(now_epoch_ms);
        self.state.accumulated_ms = self.state.accumulated_ms.saturating_add(interval);
        self.close_interval();
    }

    /// Zero the run state. Laps, mode and target are kept.
    pub fn reset(&mut self) {
        self.state.accumulated_ms = 0;
        self.close_interval();
    }

    /// Prepend the current display value to the lap history and return it.
    ///
    /// Meant to be called while running; while paused it records the frozen
    /// value again.
    pub fn record_lap(&mut self, now_epoch_ms: i64) -> u64 {
        let value = self.display_ms(now_epoch_ms);
        self.state.laps.insert(0, value);
        value
    }

    pub fn clear_laps(&mut self) {
        self.state.laps.clear();
    }

    /// Switch to countdown with a new target and restart from zero elapsed.
    pub fn apply_preset(&mut self, preset_id: impl Into<String>, duration_ms: u64) {
        // One assignment: no observer can see the new target while running.
        self.state = TimerState {
            accumulated_ms: 0,
            running: false,
            interval_start_epoch_ms: None,
            mode: Mode::Countdown,
            target_duration_ms: duration_ms,
            selected_preset_id: Some(preset_id.into()),
            laps: std::mem::take(&mut self.state.laps),
        };
    }

    /// Flip the mode, leaving run state, laps and target untouched
    pub fn toggle_mode(&mut self) {
        self.state.mode = self.state.mode.toggled();
    }

    /// Correct a freshly loaded state for time that passed while nothing was
    /// ticking. Returns `true` when a countdown was found to have finished.
    pub fn reconcile(&mut self, now_epoch_ms: i64) -> bool {
        if self.state.running && self.countdown_reached(now_epoch_ms) {
            self.finish(now_epoch_ms);
            return true;
        }
        false
    }

    /// Live completion check, driven by the host tick. Hosts also run it
    /// before every other operation on a live timer.
    ///
    /// A running countdown whose display value reached zero is paused. Returns
    /// `true` on the call that performs that transition, so repeated polling at
    /// zero reports completion once.
    pub fn poll(&mut self, now_epoch_ms: i64) -> bool {
        if !self.state.running || self.state.mode != Mode::Countdown {
            return false;
        }
        if self.display_ms(now_epoch_ms) > 0 {
            return false;
        }
        self.finish(now_epoch_ms);
        // A zero target never counted down; it just stops.
        self.state.target_duration_ms > 0
    }

    fn countdown_reached(&self, now_epoch_ms: i64) -> bool {
        self.state.mode == Mode::Countdown
            && self.state.target_duration_ms > 0
            && self.state.elapsed_ms(now_epoch_ms) >= self.state.target_duration_ms
    }

    /// Completion is a pause: the whole open interval is folded. Any overshoot
    /// past the target only shows as a countdown display clamped at zero.
    fn finish(&mut self, now_epoch_ms: i64) {
        self.pause(now_epoch_ms);
    }

    fn close_interval(&mut self) {
        self.state.running = false;
        self.state.interval_start_epoch_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(target_ms: u64) -> TimingEngine {
        let mut engine = TimingEngine::new();
        engine.apply_preset("test", target_ms);
        engine
    }

    #[test]
    fn test_stopwatch_start_pause_freezes() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        engine.pause(5_000);

        assert_eq!(engine.display_ms(5_000), 5_000);
        assert_eq!(engine.display_ms(60_000), 5_000);
        assert_eq!(engine.status(60_000), RunStatus::Idle);
        assert!(engine.state().is_consistent());
    }

    #[test]
    fn test_stopwatch_resume_accumulates() {
        let mut engine = TimingEngine::new();
        engine.start(1_000).unwrap();
        engine.pause(2_000);
        engine.start(5_000).unwrap();
        assert_eq!(engine.display_ms(5_500), 1_500);
    }

    #[test]
    fn test_start_while_running_keeps_original_stamp() {
        let mut engine = TimingEngine::new();
        engine.start(1_000).unwrap();
        engine.start(4_000).unwrap();
        assert_eq!(engine.state().interval_start_epoch_ms, Some(1_000));
        assert_eq!(engine.display_ms(4_000), 3_000);
    }

    #[test]
    fn test_pause_while_paused_is_noop() {
        let mut engine = TimingEngine::new();
        engine.pause(9_000);
        assert_eq!(engine, TimingEngine::new());
    }

    #[test]
    fn test_display_tracks_clock_while_running() {
        let mut engine = TimingEngine::new();
        engine.start(10_000).unwrap();
        let t1 = 12_345;
        let t2 = 19_000;
        assert_eq!(engine.display_ms(t2) - engine.display_ms(t1), (t2 - t1) as u64);

        let mut engine = countdown(60_000);
        engine.start(10_000).unwrap();
        assert_eq!(engine.display_ms(t1) - engine.display_ms(t2), (t2 - t1) as u64);
    }

    #[test]
    fn test_display_is_side_effect_free() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        let before = engine.clone();
        assert_eq!(engine.display_ms(700), engine.display_ms(700));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_countdown_requires_preset() {
        let mut engine = TimingEngine::new();
        engine.toggle_mode();
        let before = engine.clone();

        assert_eq!(engine.start(0), Err(EngineError::PresetRequired));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_countdown_finishes_once_on_poll() {
        let mut engine = countdown(10_000);
        engine.start(0).unwrap();

        assert!(!engine.poll(9_750));
        assert_eq!(engine.display_ms(9_750), 250);

        assert!(engine.poll(10_000));
        assert!(!engine.state().running);
        assert_eq!(engine.display_ms(10_000), 0);
        assert_eq!(engine.status(10_000), RunStatus::Finished);

        assert!(!engine.poll(10_250));
        assert!(!engine.poll(20_000));
    }

    #[test]
    fn test_late_poll_folds_whole_interval() {
        let mut engine = countdown(10_000);
        engine.start(0).unwrap();
        assert!(engine.poll(10_400));
        assert_eq!(engine.state().accumulated_ms, 10_400);
        assert_eq!(engine.display_ms(10_400), 0);
        assert_eq!(engine.status(10_400), RunStatus::Finished);
    }

    #[test]
    fn test_pause_after_zero_before_tick_finishes() {
        let mut engine = countdown(10_000);
        engine.start(0).unwrap();
        engine.pause(10_200);

        assert!(!engine.state().running);
        assert_eq!(engine.display_ms(10_200), 0);
        assert_eq!(engine.status(10_200), RunStatus::Finished);
        // Already stopped, so a late tick has nothing left to report.
        assert!(!engine.poll(10_250));
        assert_eq!(engine.start(10_300), Err(EngineError::CountdownFinished));
    }

    #[test]
    fn test_lap_after_zero_before_tick_records_zero() {
        let mut engine = countdown(10_000);
        engine.start(0).unwrap();
        assert_eq!(engine.record_lap(10_500), 0);
        assert!(engine.poll(10_500));
        assert_eq!(engine.state().laps, vec![0]);
    }

    #[test]
    fn test_stopwatch_toggled_into_zero_target_countdown_keeps_time() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        engine.toggle_mode();

        // A zero target never counted down: stopped, but not reported.
        assert!(!engine.poll(60_000));
        assert!(!engine.state().running);
        assert_eq!(engine.status(60_000), RunStatus::Idle);

        engine.toggle_mode();
        assert_eq!(engine.display_ms(60_000), 60_000);
        assert_eq!(engine.display_ms(90_000), 60_000);
    }

    #[test]
    fn test_stopwatch_past_old_target_keeps_time() {
        let mut engine = countdown(10_000);
        engine.toggle_mode();
        engine.start(0).unwrap();
        assert!(!engine.poll(60_000));

        engine.toggle_mode();
        assert!(engine.poll(60_000));
        assert_eq!(engine.status(60_000), RunStatus::Finished);

        engine.toggle_mode();
        assert_eq!(engine.display_ms(75_000), 60_000);
    }

    #[test]
    fn test_start_after_finish_is_rejected() {
        let mut engine = countdown(1_000);
        engine.start(0).unwrap();
        assert!(engine.poll(1_000));

        assert_eq!(engine.start(2_000), Err(EngineError::CountdownFinished));
        engine.reset();
        assert_eq!(engine.status(2_000), RunStatus::Idle);
        assert!(engine.start(2_000).is_ok());
    }

    #[test]
    fn test_reset_is_idempotent_and_keeps_laps() {
        let mut engine = countdown(30_000);
        engine.start(0).unwrap();
        engine.record_lap(1_000);
        engine.reset();
        let once = engine.clone();
        engine.reset();

        assert_eq!(engine, once);
        assert_eq!(engine.state().laps, vec![29_000]);
        assert_eq!(engine.state().mode, Mode::Countdown);
        assert_eq!(engine.state().target_duration_ms, 30_000);
        assert_eq!(engine.state().accumulated_ms, 0);
    }

    #[test]
    fn test_laps_newest_first() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        assert_eq!(engine.record_lap(3_000), 3_000);
        assert_eq!(engine.state().laps, vec![3_000]);
        engine.record_lap(7_000);
        assert_eq!(engine.state().laps, vec![7_000, 3_000]);
    }

    #[test]
    fn test_lap_keeps_duplicates() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        engine.pause(2_000);
        engine.record_lap(3_000);
        engine.record_lap(4_000);
        assert_eq!(engine.state().laps, vec![2_000, 2_000]);
    }

    #[test]
    fn test_clear_laps_on_empty_is_noop() {
        let mut engine = TimingEngine::new();
        engine.clear_laps();
        assert_eq!(engine, TimingEngine::new());
    }

    #[test]
    fn test_apply_preset_while_running_stops_and_zeroes() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        engine.record_lap(2_000);
        engine.apply_preset("tea", 180_000);

        let state = engine.state();
        assert!(!state.running);
        assert_eq!(state.interval_start_epoch_ms, None);
        assert_eq!(state.accumulated_ms, 0);
        assert_eq!(state.mode, Mode::Countdown);
        assert_eq!(state.target_duration_ms, 180_000);
        assert_eq!(state.selected_preset_id.as_deref(), Some("tea"));
        assert_eq!(state.laps, vec![2_000]);
        assert_eq!(engine.display_ms(50_000), 180_000);
    }

    #[test]
    fn test_toggle_mode_preserves_run_state() {
        let mut engine = countdown(10_000);
        engine.start(0).unwrap();
        engine.record_lap(4_000);
        engine.toggle_mode();

        let state = engine.state();
        assert_eq!(state.mode, Mode::Stopwatch);
        assert!(state.running);
        assert_eq!(state.interval_start_epoch_ms, Some(0));
        assert_eq!(state.target_duration_ms, 10_000);
        assert_eq!(state.laps, vec![6_000]);
        assert_eq!(engine.display_ms(4_000), 4_000);
    }

    #[test]
    fn test_reconcile_finishes_expired_countdown() {
        let t0 = 1_700_000_000_000;
        let state = TimerState {
            running: true,
            interval_start_epoch_ms: Some(t0),
            mode: Mode::Countdown,
            target_duration_ms: 5_000,
            ..TimerState::default()
        };
        let mut engine = TimingEngine::from_state(state);

        assert!(engine.reconcile(t0 + 9_000));
        assert!(!engine.state().running);
        assert_eq!(engine.state().interval_start_epoch_ms, None);
        assert_eq!(engine.display_ms(t0 + 9_000), 0);
        assert_eq!(engine.status(t0 + 9_000), RunStatus::Finished);
    }

    #[test]
    fn test_reconcile_leaves_live_runs_alone() {
        let mut engine = countdown(5_000);
        engine.start(0).unwrap();
        assert!(!engine.reconcile(4_000));
        assert!(engine.state().running);

        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        assert!(!engine.reconcile(86_400_000));
        assert!(engine.state().running);
        assert_eq!(engine.display_ms(86_400_000), 86_400_000);
    }
}
