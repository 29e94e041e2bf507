//! Lapwatch - a stopwatch and countdown timer for hosts that come and go
//!
//! This is the main entry point for the lapwatch binary.

use std::sync::Arc;
use tracing::debug;

use lapwatch::{
    commands::run_command,
    config::Config,
    state::AppState,
    storage::{FileStore, Store},
    tasks::persistence_writer_task,
    utils::{Clock, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so one-shot command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(format!("lapwatch={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    let command = config.command();
    debug!("lapwatch v{} running {:?}", env!("CARGO_PKG_VERSION"), command);
    debug!("State file: {}", config.state_file.display());

    let store: Arc<dyn Store> = Arc::new(FileStore::new(config.state_file.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Load and reconcile whatever the previous session left behind
    let state = Arc::new(AppState::load(store, clock, config.preset_catalog()).await);

    // Start the persistence writer before any mutation can happen
    let writer_state = Arc::clone(&state);
    tokio::spawn(async move {
        persistence_writer_task(writer_state).await;
    });

    let result = run_command(Arc::clone(&state), command).await;

    // Flush even when the command was rejected, e.g. a reconcile on load
    state.flush().await;
    debug!("Timer state saved");
    result
}
