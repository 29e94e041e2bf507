//! Background tasks module
//!
//! Tasks that run alongside a host: the display ticker and the persistence
//! writer.

pub mod display_ticker;
pub mod persistence_writer;

// Re-export main functions
pub use display_ticker::{display_ticker_task, DEFAULT_TICK};
pub use persistence_writer::persistence_writer_task;
