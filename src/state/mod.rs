//! State management module
//!
//! The timer data model, the engine that operates on it, the display
//! projection, and the shared application state that hosts talk to.

pub mod app_state;
pub mod engine;
pub mod timer_state;
pub mod view;

// Re-export main types
pub use app_state::{AppState, Snapshot, TickReport};
pub use engine::{compute_display_ms, RunStatus, TimingEngine};
pub use timer_state::{Mode, TimerState};
pub use view::TimerView;
pub(crate) use view::clamp_i64;
