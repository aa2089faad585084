use std::path::Path;
use std::sync::Arc;

use imgrelay::config::{self, Config};
use imgrelay::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create Tokio runtime, sizing worker threads from configuration
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.static_files.create_dirs {
        ensure_dir(&cfg.static_files.root)?;
        ensure_dir(&cfg.static_files.uploads_dir)?;
    }

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg)?);

    logger::log_server_start(&addr, &cfg);
    server::serve(listener, state, server::shutdown_signal()).await;
    Ok(())
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        logger::log_info(&format!("Created directory {}", dir.display()));
    }
    Ok(())
}
