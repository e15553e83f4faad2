// Signal handling module
//
// SIGINT (Ctrl+C) and SIGTERM stop the accept loop.

use std::sync::Arc;
use tokio::sync::Notify;

/// Wait for a termination signal, then notify `shutdown`
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => println!("\n[SIGNAL] SIGTERM received, shutting down..."),
            _ = sigint.recv() => println!("\n[SIGNAL] SIGINT received (Ctrl+C), shutting down..."),
        }
        shutdown.notify_one();
    });
    Ok(())
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            println!("\n[SIGNAL] Ctrl+C received, shutting down...");
            shutdown.notify_one();
        }
    });
    Ok(())
}
