//! Logger module
//!
//! Thin helpers over `tracing` used across the server:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - Optional file output

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::fs::{File, OpenOptions};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match config.log_file.as_deref() {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };

    result.map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.log_file {
        tracing::info!("Log file: {path}");
    }
    tracing::info!(
        "Static files: {}/* -> {}",
        config.static_files.url_prefix.trim_end_matches('/'),
        config.static_files.root.display()
    );
    tracing::info!(
        "Uploads: {}/* -> {}",
        config.static_files.uploads_prefix.trim_end_matches('/'),
        config.static_files.uploads_dir.display()
    );
    tracing::info!(
        "Image proxy: {}?url=... (timeout {}s)",
        config.proxy.route,
        config.proxy.timeout().as_secs()
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_shutdown(active: usize) {
    tracing::info!("Shutdown requested, waiting for {active} active connection(s)");
}

pub fn log_info(message: &str) {
    tracing::info!("{message}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_debug(message: &str) {
    tracing::debug!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
