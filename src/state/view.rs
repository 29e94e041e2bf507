//! Display projection of the engine for hosts

use serde::{Deserialize, Serialize};

use super::engine::{RunStatus, TimingEngine};
use super::timer_state::Mode;
use crate::format::format_hms;

/// Everything a host needs to paint the timer at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub mode: Mode,
    pub status: RunStatus,
    pub running: bool,
    pub display_ms: u64,
    pub display: String,
    pub target_duration_ms: u64,
    pub selected_preset_id: Option<String>,
    /// Newest first
    pub laps: Vec<u64>,
    pub laps_display: Vec<String>,
}

impl TimerView {
    pub fn capture(engine: &TimingEngine, now_epoch_ms: i64) -> Self {
        let state = engine.state();
        let display_ms = engine.display_ms(now_epoch_ms);
        Self {
            mode: state.mode,
            status: engine.status(now_epoch_ms),
            running: state.running,
            display_ms,
            display: format_hms(clamp_i64(display_ms)),
            target_duration_ms: state.target_duration_ms,
            selected_preset_id: state.selected_preset_id.clone(),
            laps: state.laps.clone(),
            laps_display: state.laps.iter().map(|&lap| format_hms(clamp_i64(lap))).collect(),
        }
    }
}

impl Default for TimerView {
    fn default() -> Self {
        Self::capture(&TimingEngine::new(), 0)
    }
}

/// Millisecond count as the signed value `format_hms` takes, saturating
pub(crate) fn clamp_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
