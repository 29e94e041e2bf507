//! Lapwatch - a stopwatch and countdown timer for hosts that come and go
//!
//! The timer is kept as timestamps plus arithmetic rather than a live counter,
//! so the correct time is shown immediately after the hosting process is
//! restarted. This library provides the timing engine, its persistence, and
//! the CLI and HTTP hosts built on top of it.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod presets;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{AppError, EngineError, StoreError};
pub use format::format_hms;
pub use presets::{Preset, PresetCatalog};
pub use state::{AppState, Mode, RunStatus, TimerState, TimerView, TimingEngine};
pub use storage::{FileStore, MemoryStore, Store};
pub use utils::shutdown_signal;
