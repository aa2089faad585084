// Application state module
// Immutable per-process state shared by every connection

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::Config;
use crate::paths::StaticResolver;
use crate::proxy::ImageProxyFetcher;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Resolver for the sanitized static route
    pub static_resolver: StaticResolver,
    pub fetcher: ImageProxyFetcher,
    /// Connections currently being served
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_fetcher(config, ImageProxyFetcher::new(config)?))
    }

    pub fn with_fetcher(config: &Config, fetcher: ImageProxyFetcher) -> Self {
        Self {
            config: config.clone(),
            static_resolver: StaticResolver::new(&config.static_files.root),
            fetcher,
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}
