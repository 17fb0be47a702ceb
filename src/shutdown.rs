use crate::error::{other_error, BotResult};
use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal
#[cfg(unix)]
pub async fn wait_for_signal() -> BotResult<()> {
    // SIGTERM is what the container runtime sends on stop
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| other_error(&format!("Failed to create SIGTERM signal handler: {}", e)))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| other_error(&format!("Failed to create SIGINT signal handler: {}", e)))?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }

    Ok(())
}

/// Wait for a termination signal
#[cfg(windows)]
pub async fn wait_for_signal() -> BotResult<()> {
    let mut ctrlc = ctrl_c()
        .map_err(|e| other_error(&format!("Failed to create Ctrl+C signal handler: {}", e)))?;
    let mut ctrlbreak = ctrl_break()
        .map_err(|e| other_error(&format!("Failed to create Ctrl+Break signal handler: {}", e)))?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }

    Ok(())
}
