//! imgrelay
//!
//! HTTP service that proxies remote images past hotlink/CORS restrictions and
//! serves local static files under sanitized, traversal-safe paths.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod paths;
pub mod proxy;
pub mod server;
