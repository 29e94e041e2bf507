//! Timer state structure

use serde::{Deserialize, Serialize};

/// Which formula turns accrued time into a display value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Stopwatch,
    Countdown,
}

impl Mode {
    /// Stable name used in persisted records and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Stopwatch => "stopwatch",
            Mode::Countdown => "countdown",
        }
    }

    /// Parse a persisted mode name, `None` for anything unrecognised
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stopwatch" => Some(Mode::Stopwatch),
            "countdown" => Some(Mode::Countdown),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Stopwatch => Mode::Countdown,
            Mode::Countdown => Mode::Stopwatch,
        }
    }
}

/// Everything needed to derive the display value at any instant.
///
/// Time is never counted by ticks: `accumulated_ms` holds closed intervals and
/// `interval_start_epoch_ms` marks the open one. `running` is true exactly
/// when `interval_start_epoch_ms` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerState {
    pub accumulated_ms: u64,
    pub running: bool,
    pub interval_start_epoch_ms: Option<i64>,
    pub mode: Mode,
    pub target_duration_ms: u64,
    pub selected_preset_id: Option<String>,
    /// Newest first
    pub laps: Vec<u64>,
}

impl TimerState {
    /// Create the default first-use state
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the open interval at `now_epoch_ms`, zero when paused.
    ///
    /// A start stamp later than `now` (clock moved backwards) yields zero.
    pub fn open_interval_ms(&self, now_epoch_ms: i64) -> u64 {
        match (self.running, self.interval_start_epoch_ms) {
            (true, Some(start)) => u64::try_from(now_epoch_ms.saturating_sub(start)).unwrap_or(0),
            _ => 0,
        }
    }

    /// Interval-inclusive elapsed time, before any countdown clamping
    pub fn elapsed_ms(&self, now_epoch_ms: i64) -> u64 {
        self.accumulated_ms
            .saturating_add(self.open_interval_ms(now_epoch_ms))
    }

    /// Whether the running/start-stamp pairing holds
    pub fn is_consistent(&self) -> bool {
        self.running == self.interval_start_epoch_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = TimerState::new();
        assert_eq!(state.accumulated_ms, 0);
        assert!(!state.running);
        assert_eq!(state.interval_start_epoch_ms, None);
        assert_eq!(state.mode, Mode::Stopwatch);
        assert_eq!(state.target_duration_ms, 0);
        assert!(state.laps.is_empty());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_open_interval_ignores_backwards_clock() {
        let state = TimerState {
            accumulated_ms: 1_000,
            running: true,
            interval_start_epoch_ms: Some(10_000),
            ..TimerState::default()
        };
        assert_eq!(state.open_interval_ms(9_000), 0);
        assert_eq!(state.elapsed_ms(9_000), 1_000);
        assert_eq!(state.elapsed_ms(12_500), 3_500);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::from_name(Mode::Countdown.as_str()), Some(Mode::Countdown));
        assert_eq!(Mode::from_name("hourglass"), None);
        assert_eq!(Mode::Stopwatch.toggled(), Mode::Countdown);
    }
}
