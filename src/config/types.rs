// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub static_files: StaticFilesConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Log file path (optional, stderr if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound for a whole connection, in seconds
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Local file serving: the sanitized static tree and the plain uploads tree
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StaticFilesConfig {
    /// URL prefix of the sanitized static route, e.g. `/static`
    pub url_prefix: String,
    pub root: PathBuf,
    pub uploads_prefix: String,
    pub uploads_dir: PathBuf,
    /// Create `root` and `uploads_dir` at startup when missing
    pub create_dirs: bool,
}

impl StaticFilesConfig {
    /// `url_prefix` with exactly one trailing slash, e.g. `/static/`
    pub fn prefix_with_slash(&self) -> String {
        format!("{}/", self.url_prefix.trim_end_matches('/'))
    }

    pub fn uploads_prefix_with_slash(&self) -> String {
        format!("{}/", self.uploads_prefix.trim_end_matches('/'))
    }
}

/// Image proxy configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProxyConfig {
    /// Route of the proxy endpoint
    pub route: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub user_agent: String,
    /// Host names treated as this server when they point at the static prefix
    pub local_hosts: Vec<String>,
}

/// Upstream timeouts are kept inside this window
pub const PROXY_TIMEOUT_RANGE: (u64, u64) = (10, 15);

impl ProxyConfig {
    pub fn timeout(&self) -> std::time::Duration {
        let (min, max) = PROXY_TIMEOUT_RANGE;
        std::time::Duration::from_secs(self.timeout_secs.clamp(min, max))
    }

    pub fn is_local_host(&self, host: &str) -> bool {
        self.local_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_path")]
    pub path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/healthz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            path: default_health_path(),
        }
    }
}
