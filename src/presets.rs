//! Countdown preset catalog

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MINUTE_MS: u64 = 60 * 1000;

/// A named countdown duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub label: String,
    pub duration_ms: u64,
}

impl Preset {
    pub fn new(id: impl Into<String>, label: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            duration_ms,
        }
    }

    pub fn minutes(id: &str, label: &str, minutes: u64) -> Self {
        Self::new(id, label, minutes * MINUTE_MS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetParseError {
    #[error("expected ID=MINUTES, got {0:?}")]
    MissingSeparator(String),
    #[error("preset id must not be empty")]
    EmptyId,
    #[error("invalid minutes {0:?}")]
    InvalidMinutes(String),
}

/// Parses the CLI form `ID=MINUTES`; minutes may be fractional (`tea=2.5`).
impl FromStr for Preset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, minutes) = s
            .split_once('=')
            .ok_or_else(|| PresetParseError::MissingSeparator(s.to_string()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(PresetParseError::EmptyId);
        }
        let minutes_value: f64 = minutes
            .trim()
            .parse()
            .map_err(|_| PresetParseError::InvalidMinutes(minutes.to_string()))?;
        if !minutes_value.is_finite() || minutes_value < 0.0 {
            return Err(PresetParseError::InvalidMinutes(minutes.to_string()));
        }
        let duration_ms = (minutes_value * MINUTE_MS as f64).round() as u64;
        Ok(Self::new(id, id, duration_ms))
    }
}

/// Ordered set of presets offered to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    /// Build a catalog; a later preset with an already-seen id replaces the
    /// earlier one in place.
    pub fn new(presets: impl IntoIterator<Item = Preset>) -> Self {
        let mut catalog = Self { presets: Vec::new() };
        for preset in presets {
            match catalog.presets.iter_mut().find(|p| p.id == preset.id) {
                Some(existing) => *existing = preset,
                None => catalog.presets.push(preset),
            }
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new([
            Preset::minutes("pomodoro", "Pomodoro", 25),
            Preset::minutes("short-break", "Short Break", 5),
            Preset::minutes("long-break", "Long Break", 15),
            Preset::minutes("tea", "Tea", 3),
        ])
    }
}
