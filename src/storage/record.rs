//! Conversion between `TimerState` and the persisted flat record

use serde_json::Value;
use tracing::warn;

use super::Record;
use crate::state::{Mode, TimerState};

const KEY_ACCUMULATED: &str = "accumulatedMs";
const KEY_RUNNING: &str = "running";
const KEY_INTERVAL_START: &str = "intervalStartEpochMs";
const KEY_LAPS: &str = "laps";
const KEY_MODE: &str = "mode";
const KEY_TARGET: &str = "targetDurationMs";
const KEY_PRESET: &str = "selectedPresetId";

/// Every key the timer reads and writes
pub const STATE_KEYS: [&str; 7] = [
    KEY_ACCUMULATED,
    KEY_RUNNING,
    KEY_INTERVAL_START,
    KEY_LAPS,
    KEY_MODE,
    KEY_TARGET,
    KEY_PRESET,
];

/// Build the full record for `state`.
///
/// Optional fields are written as `null` so a merge-style store clears them.
/// Laps are written as a JSON array string, newest first.
pub fn encode_state(state: &TimerState) -> Record {
    let mut record = Record::new();
    record.insert(KEY_ACCUMULATED.to_string(), Value::from(state.accumulated_ms));
    record.insert(KEY_RUNNING.to_string(), Value::from(state.running));
    record.insert(
        KEY_INTERVAL_START.to_string(),
        state.interval_start_epoch_ms.map_or(Value::Null, Value::from),
    );
    record.insert(KEY_LAPS.to_string(), Value::String(encode_laps(&state.laps)));
    record.insert(KEY_MODE.to_string(), Value::from(state.mode.as_str()));
    record.insert(KEY_TARGET.to_string(), Value::from(state.target_duration_ms));
    record.insert(
        KEY_PRESET.to_string(),
        state
            .selected_preset_id
            .as_ref()
            .map_or(Value::Null, |id| Value::from(id.as_str())),
    );
    record
}

/// Rebuild a state from a record, defaulting every missing or unreadable key.
///
/// A running flag without a start stamp (or a stamp without the flag) is
/// repaired to not-running.
pub fn decode_state(record: &Record) -> TimerState {
    let mut state = TimerState::new();

    state.accumulated_ms = record.get(KEY_ACCUMULATED).and_then(read_u64).unwrap_or(0);
    state.target_duration_ms = record.get(KEY_TARGET).and_then(read_u64).unwrap_or(0);

    state.mode = match record.get(KEY_MODE) {
        Some(Value::String(name)) => Mode::from_name(name).unwrap_or_else(|| {
            warn!("Unknown persisted mode {:?}, using stopwatch", name);
            Mode::Stopwatch
        }),
        _ => Mode::Stopwatch,
    };

    state.selected_preset_id = match record.get(KEY_PRESET) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        _ => None,
    };

    let running = matches!(record.get(KEY_RUNNING), Some(Value::Bool(true)));
    let start = record.get(KEY_INTERVAL_START).and_then(read_i64);
    match (running, start) {
        (true, Some(start)) => {
            state.running = true;
            state.interval_start_epoch_ms = Some(start);
        }
        (true, None) => warn!("Persisted state was running without a start time, loading as paused"),
        _ => {}
    }

    state.laps = match record.get(KEY_LAPS) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => decode_laps(value).unwrap_or_else(|| {
            warn!("Discarding malformed persisted laps: {}", value);
            Vec::new()
        }),
    };

    state
}

fn encode_laps(laps: &[u64]) -> String {
    Value::from(laps.to_vec()).to_string()
}

/// Accepts the array string written by `encode_state` or a native array
fn decode_laps(value: &Value) -> Option<Vec<u64>> {
    match value {
        Value::String(text) => serde_json::from_str::<Vec<u64>>(text).ok(),
        Value::Array(_) => serde_json::from_value::<Vec<u64>>(value.clone()).ok(),
        _ => None,
    }
}

/// Integer fields tolerate numeric strings, as some stores stringify values
fn read_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
