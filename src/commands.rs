//! One-shot and interactive CLI hosts
//!
//! Each invocation behaves like opening the timer window: the persisted state
//! is loaded and reconciled, one operation runs, the result is saved and
//! printed, and the process exits.

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    api::create_router,
    config::Command,
    error::{AppError, EngineError},
    format::format_hms,
    state::{clamp_i64, AppState, RunStatus, TimerView},
    tasks::{display_ticker_task, DEFAULT_TICK},
    utils::shutdown_signal,
};

/// Run `command` against `state`. Callers flush the state afterwards.
pub async fn run_command(state: Arc<AppState>, command: Command) -> anyhow::Result<()> {
    match &command {
        Command::Status => print_view(&state.view()?),
        Command::Start => print_view(&state.start().map_err(explain)?),
        Command::Pause => print_view(&state.pause()?),
        Command::Reset => print_view(&state.reset()?),
        Command::Lap => {
            let (lap, view) = state.record_lap()?;
            println!("Lap {}", format_hms(clamp_i64(lap)));
            print_view(&view);
        }
        Command::ClearLaps => print_view(&state.clear_laps()?),
        Command::Preset { id } => print_view(&state.apply_preset(id).map_err(explain)?),
        Command::ToggleMode => print_view(&state.toggle_mode()?),
        Command::Presets => print_presets(&state)?,
        Command::Watch { .. } => {
            let tick = command.tick().unwrap_or(DEFAULT_TICK);
            watch(Arc::clone(&state), tick).await?;
        }
        Command::Serve { .. } => {
            let addr = command.address().context("serve without an address")?;
            let tick = command.tick().unwrap_or(DEFAULT_TICK);
            serve(Arc::clone(&state), &addr, tick).await?;
        }
    }
    Ok(())
}

/// Attach a user-facing hint to recoverable engine conditions
fn explain(e: AppError) -> anyhow::Error {
    let hint = match &e {
        AppError::Engine(EngineError::PresetRequired) => {
            Some("pick one with `lapwatch preset <ID>` (see `lapwatch presets`)")
        }
        AppError::Engine(EngineError::CountdownFinished) => {
            Some("run `lapwatch reset` or choose a preset to count down again")
        }
        AppError::UnknownPreset(_) => Some("see `lapwatch presets` for available ids"),
        AppError::Lock(_) => None,
    };
    match hint {
        Some(hint) => anyhow::anyhow!("{}; {}", e, hint),
        None => e.into(),
    }
}

/// Multi-line rendering of a view, laps numbered oldest = 1
pub fn render_view(view: &TimerView) -> String {
    let status = match view.status {
        RunStatus::Idle => "paused",
        RunStatus::Running => "running",
        RunStatus::Finished => "finished",
    };
    let mut out = format!("{}  {}  {}\n", view.display, status, view.mode.as_str());
    if let Some(preset) = &view.selected_preset_id {
        out.push_str(&format!(
            "preset: {} ({})\n",
            preset,
            format_hms(clamp_i64(view.target_duration_ms))
        ));
    }
    let count = view.laps_display.len();
    for (i, lap) in view.laps_display.iter().enumerate() {
        out.push_str(&format!("  lap {:>3}  {}\n", count - i, lap));
    }
    out
}

fn print_view(view: &TimerView) {
    print!("{}", render_view(view));
}

fn print_presets(state: &AppState) -> anyhow::Result<()> {
    let selected = state.view()?.selected_preset_id;
    for preset in state.presets.iter() {
        let marker = if selected.as_deref() == Some(preset.id.as_str()) { "*" } else { " " };
        println!(
            "{} {:<14} {}  {}",
            marker,
            preset.id,
            format_hms(clamp_i64(preset.duration_ms)),
            preset.label
        );
    }
    Ok(())
}

/// Redraw the display line on every tick until the timer stops or a
/// shutdown signal arrives. Closing `watch` never stops the timer itself.
async fn watch(state: Arc<AppState>, tick: Duration) -> anyhow::Result<()> {
    let mut view_rx = state.view_tx.subscribe();
    let initial = view_rx.borrow_and_update().clone();
    if initial.status != RunStatus::Running {
        print_view(&initial);
        return Ok(());
    }

    let ticker = tokio::spawn(display_ticker_task(Arc::clone(&state), tick));
    let mut stdout = io::stdout();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break None;
                }
                let view = view_rx.borrow_and_update().clone();
                write!(stdout, "\r{}  ", view.display)?;
                stdout.flush()?;
                if view.status != RunStatus::Running {
                    break Some(view);
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, timer keeps running");
                break None;
            }
        }
    };
    ticker.abort();

    writeln!(stdout)?;
    if let Some(view) = outcome {
        if view.status == RunStatus::Finished {
            println!("Time's up!");
        }
        print_view(&view);
    }
    Ok(())
}

/// Serve the HTTP API with the display ticker running alongside
async fn serve(state: Arc<AppState>, addr: &str, tick: Duration) -> anyhow::Result<()> {
    let ticker = tokio::spawn(display_ticker_task(Arc::clone(&state), tick));

    let app = create_router(Arc::clone(&state));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start          - Start or resume");
    info!("  POST /pause          - Pause");
    info!("  POST /reset          - Reset elapsed time");
    info!("  POST /lap            - Record a lap");
    info!("  POST /laps/clear     - Clear laps");
    info!("  POST /preset/:id     - Select a countdown preset");
    info!("  POST /mode/toggle    - Switch stopwatch/countdown");
    info!("  GET  /status         - Current time and laps");
    info!("  GET  /presets        - Preset catalog");
    info!("  GET  /health         - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    ticker.abort();
    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimingEngine;

    #[test]
    fn test_render_numbers_laps_oldest_first() {
        let mut engine = TimingEngine::new();
        engine.start(0).unwrap();
        engine.record_lap(3_000);
        engine.record_lap(7_000);
        let view = TimerView::capture(&engine, 9_000);

        let text = render_view(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "00:00:09  running  stopwatch");
        assert_eq!(lines[1], "  lap   2  00:00:07");
        assert_eq!(lines[2], "  lap   1  00:00:03");
    }

    #[test]
    fn test_render_shows_preset() {
        let mut engine = TimingEngine::new();
        engine.apply_preset("tea", 180_000);
        let view = TimerView::capture(&engine, 0);
        assert_eq!(
            render_view(&view),
            "00:03:00  paused  countdown\npreset: tea (00:03:00)\n"
        );
    }
}
