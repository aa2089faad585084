//! Image proxy
//!
//! Cleans a client-supplied image URL and serves it either from the static
//! root or from the upstream host.

pub mod clean;
pub mod error;
pub mod fetch;

pub use clean::clean_url;
pub use error::ProxyError;
pub use fetch::{build_client, ImageProxyFetcher, ImageSource, ProxiedImage, ResolvedTarget};
