// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C) request a graceful shutdown. Elsewhere only
// Ctrl+C is available.

use crate::logger;

/// Resolves once a shutdown signal has been received
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
            wait_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        () = wait_ctrl_c() => {}
        _ = sigterm.recv() => logger::log_info("SIGTERM received, initiating graceful shutdown"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger::log_info("SIGINT received, initiating graceful shutdown"),
        Err(e) => {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    }
}
