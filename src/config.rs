//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

use crate::presets::{Preset, PresetCatalog};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "lapwatch")]
#[command(about = "A stopwatch and countdown timer that survives being closed and reopened")]
#[command(version)]
pub struct Config {
    /// File holding the persisted timer state
    #[arg(long, global = true, default_value = "lapwatch-state.json")]
    pub state_file: PathBuf,

    /// Countdown preset as ID=MINUTES; repeat to build the catalog
    #[arg(long = "preset", global = true, value_name = "ID=MINUTES")]
    pub presets: Vec<Preset>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the current time, status and laps
    Status,
    /// Start or resume the timer
    Start,
    /// Pause the timer
    Pause,
    /// Zero the timer, keeping laps and mode
    Reset,
    /// Record a lap at the current display value
    Lap,
    /// Empty the lap history
    ClearLaps,
    /// Select a countdown preset and restart the countdown
    Preset {
        /// Preset id from the catalog
        id: String,
    },
    /// Switch between stopwatch and countdown
    ToggleMode,
    /// List the preset catalog
    Presets,
    /// Keep redrawing the time until the timer stops or Ctrl-C
    Watch {
        /// Refresh interval in milliseconds
        #[arg(long, default_value = "250")]
        tick_ms: u64,
    },
    /// Serve the timer over HTTP
    Serve {
        /// Port to bind the server to
        #[arg(short, long, default_value = "20554")]
        port: u16,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Display refresh interval in milliseconds
        #[arg(long, default_value = "250")]
        tick_ms: u64,
    },
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Subcommand to run; plain `lapwatch` shows the status
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }

    /// Presets from the command line, or the built-in catalog when none given
    pub fn preset_catalog(&self) -> PresetCatalog {
        if self.presets.is_empty() {
            PresetCatalog::default()
        } else {
            PresetCatalog::new(self.presets.iter().cloned())
        }
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

impl Command {
    /// Get the server address as a formatted string, for `serve`
    pub fn address(&self) -> Option<String> {
        match self {
            Command::Serve { host, port, .. } => Some(format!("{}:{}", host, port)),
            _ => None,
        }
    }

    /// Tick interval for hosts that refresh the display
    pub fn tick(&self) -> Option<Duration> {
        match self {
            Command::Watch { tick_ms } | Command::Serve { tick_ms, .. } => {
                Some(Duration::from_millis((*tick_ms).max(1)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_status() {
        let config = Config::try_parse_from(["lapwatch"]).unwrap();
        assert!(matches!(config.command(), Command::Status));
        assert_eq!(config.state_file, PathBuf::from("lapwatch-state.json"));
        assert_eq!(config.preset_catalog(), PresetCatalog::default());
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_presets_replace_catalog() {
        let config = Config::try_parse_from([
            "lapwatch", "preset", "eggs", "--preset", "eggs=7", "--preset", "rice=18", "-v",
        ])
        .unwrap();
        let catalog = config.preset_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("eggs").map(|p| p.duration_ms), Some(420_000));
        assert!(matches!(config.command(), Command::Preset { ref id } if id == "eggs"));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_bad_preset_is_rejected() {
        assert!(Config::try_parse_from(["lapwatch", "--preset", "eggs"]).is_err());
    }

    #[test]
    fn test_serve_address_and_tick() {
        let config =
            Config::try_parse_from(["lapwatch", "serve", "--port", "9000", "--tick-ms", "100"]).unwrap();
        let command = config.command();
        assert_eq!(command.address().as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(command.tick(), Some(Duration::from_millis(100)));
        assert_eq!(Command::Lap.tick(), None);
    }
}
