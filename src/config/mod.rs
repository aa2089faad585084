// Configuration module entry point
// Loads application configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig, ProxyConfig,
    ServerConfig, StaticFilesConfig, PROXY_TIMEOUT_RANGE,
};

/// Default config file (without extension) when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config";

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Environment variables override the file, e.g. `IMGRELAY_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("IMGRELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, no file or environment
    pub fn defaults() -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn with_defaults(builder: Builder) -> Result<Builder, config::ConfigError> {
    builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8483)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.connection_timeout", 60)?
        .set_default("http.server_name", "imgrelay")?
        .set_default("http.enable_cors", true)?
        .set_default("http.max_body_size", 1_048_576)? // 1MB, GET-only service
        .set_default("static_files.url_prefix", "/static")?
        .set_default("static_files.root", "./static")?
        .set_default("static_files.uploads_prefix", "/uploads")?
        .set_default("static_files.uploads_dir", "./uploads")?
        .set_default("static_files.create_dirs", true)?
        .set_default("proxy.route", "/proxy-image")?
        .set_default("proxy.timeout_secs", 10)?
        .set_default("proxy.referer", "https://www.bilibili.com/")?
        .set_default("proxy.user_agent", "BiliNote-Proxy/1.0")?
        .set_default("proxy.local_hosts", vec!["localhost", "127.0.0.1"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.port, 8483);
        assert_eq!(cfg.static_files.url_prefix, "/static");
        assert_eq!(cfg.static_files.prefix_with_slash(), "/static/");
        assert_eq!(cfg.static_files.uploads_prefix_with_slash(), "/uploads/");
        assert_eq!(cfg.proxy.route, "/proxy-image");
        assert_eq!(cfg.proxy.user_agent, "BiliNote-Proxy/1.0");
        assert_eq!(cfg.proxy.referer, "https://www.bilibili.com/");
        assert!(cfg.proxy.is_local_host("localhost"));
        assert!(cfg.proxy.is_local_host("127.0.0.1"));
        assert!(!cfg.proxy.is_local_host("example.com"));
        assert!(cfg.health.enabled);
        assert_eq!(cfg.health.path, "/healthz");
    }

    #[test]
    fn test_proxy_timeout_is_clamped() {
        let mut cfg = Config::defaults().unwrap();
        assert_eq!(cfg.proxy.timeout(), Duration::from_secs(10));
        cfg.proxy.timeout_secs = 1;
        assert_eq!(cfg.proxy.timeout(), Duration::from_secs(10));
        cfg.proxy.timeout_secs = 120;
        assert_eq!(cfg.proxy.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::defaults().unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8483);
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load_from("/nonexistent/imgrelay-config").unwrap();
        assert_eq!(cfg.static_files.root, std::path::PathBuf::from("./static"));
    }
}
