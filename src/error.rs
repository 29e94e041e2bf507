//! Error types shared across the engine, storage and host layers

use thiserror::Error;

/// Recoverable conditions reported by timing engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start` was called in countdown mode without a positive target
    #[error("select a preset before starting the countdown")]
    PresetRequired,
    /// `start` was called on a countdown that already reached zero
    #[error("countdown already finished; reset or select a preset")]
    CountdownFinished,
}

/// Failures of the key-value persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by `AppState` to its hosts (CLI and HTTP)
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("failed to lock timer state: {0}")]
    Lock(String),
}
