//! Image proxy fetcher
//!
//! A cleaned URL is classified into a [`ResolvedTarget`] first; only then is
//! the disk read or the upstream request performed. Upstream requests carry
//! a fixed `Referer` and `User-Agent` and are bounded by the client timeout.

use std::path::PathBuf;

use hyper::body::Bytes;
use reqwest::header::{CONTENT_TYPE, REFERER, USER_AGENT};
use url::Url;

use super::clean::clean_url;
use super::error::ProxyError;
use crate::config::{Config, ProxyConfig};
use crate::http::mime::OCTET_STREAM;
use crate::logger;
use crate::paths::{sanitize_path, ResolveError, SanitizedPath, StaticFile, StaticResolver};

/// Where a proxied image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Upstream(Url),
}

#[derive(Debug, Clone)]
pub struct ProxiedImage {
    pub body: Bytes,
    pub content_type: String,
    pub source: ImageSource,
}

impl From<StaticFile> for ProxiedImage {
    fn from(file: StaticFile) -> Self {
        Self {
            body: file.content,
            content_type: file.content_type.to_string(),
            source: ImageSource::Local(file.path),
        }
    }
}

/// Per-request routing decision for a cleaned URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Serve from the static root; `fallback` is fetched if the file is missing
    Local {
        path: SanitizedPath,
        fallback: Option<Url>,
    },
    Upstream(Url),
    Rejected(ProxyError),
}

/// Shared upstream client, bounded by the clamped proxy timeout
pub fn build_client(proxy: &ProxyConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(proxy.timeout()).build()
}

/// Fetches images for the proxy endpoint
#[derive(Debug, Clone)]
pub struct ImageProxyFetcher {
    client: reqwest::Client,
    resolver: StaticResolver,
    /// Static URL prefix as a leading path segment, e.g. `static/`
    static_segment: String,
    proxy: ProxyConfig,
}

impl ImageProxyFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_client(&config.proxy)?, config))
    }

    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            resolver: StaticResolver::new(&config.static_files.root),
            static_segment: format!("{}/", config.static_files.url_prefix.trim_matches('/')),
            proxy: config.proxy.clone(),
        }
    }

    /// Fetch the image addressed by a raw `url` query value
    pub async fn fetch(&self, raw_url: &str) -> Result<ProxiedImage, ProxyError> {
        let cleaned = clean_url(raw_url);
        if cleaned != raw_url {
            logger::log_debug(&format!("Cleaned proxy URL '{raw_url}' -> '{cleaned}'"));
        }

        match self.classify(&cleaned) {
            ResolvedTarget::Rejected(err) => Err(err),
            ResolvedTarget::Upstream(url) => self.fetch_upstream(url).await,
            ResolvedTarget::Local {
                path,
                fallback: None,
            } => {
                if path.is_empty() {
                    return Err(ProxyError::BadRequest("invalid local path".to_string()));
                }
                self.read_local(&path, raw_url, &cleaned).await
            }
            ResolvedTarget::Local {
                path,
                fallback: Some(url),
            } => match self.read_local(&path, raw_url, &cleaned).await {
                Ok(image) => Ok(image),
                Err(_) => self.fetch_upstream(url).await,
            },
        }
    }

    /// Decide how a cleaned URL is served, without touching disk or network
    pub fn classify(&self, cleaned: &str) -> ResolvedTarget {
        let url = match Url::parse(cleaned) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let relative = cleaned.trim_start_matches('/');
                let relative = self.strip_static_segment(relative).unwrap_or(relative);
                return ResolvedTarget::Local {
                    path: sanitize_path(relative),
                    fallback: None,
                };
            }
            Err(e) => {
                return ResolvedTarget::Rejected(ProxyError::BadRequest(format!(
                    "invalid URL: {e}"
                )))
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            return ResolvedTarget::Rejected(ProxyError::BadRequest("invalid scheme".to_string()));
        }

        let is_local_host = url
            .host_str()
            .is_some_and(|host| self.proxy.is_local_host(host));
        if is_local_host {
            let path = url.path().trim_start_matches('/');
            if let Some(relative) = self.strip_static_segment(path) {
                return ResolvedTarget::Local {
                    path: sanitize_path(relative),
                    fallback: Some(url),
                };
            }
        }

        ResolvedTarget::Upstream(url)
    }

    fn strip_static_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.static_segment.as_str())
    }

    async fn read_local(
        &self,
        path: &SanitizedPath,
        raw: &str,
        cleaned: &str,
    ) -> Result<ProxiedImage, ProxyError> {
        match self.resolver.resolve(path).await {
            Ok(file) => Ok(file.into()),
            Err(ResolveError::NotFound) => {
                Err(ProxyError::NotFound("local file not found".to_string()))
            }
            Err(err) => {
                logger::log_error(&format!(
                    "Local image lookup failed: {err} (raw: '{raw}', cleaned: '{cleaned}')"
                ));
                Err(ProxyError::Internal("failed to read local file".to_string()))
            }
        }
    }

    async fn fetch_upstream(&self, url: Url) -> Result<ProxiedImage, ProxyError> {
        let response = self
            .client
            .get(url.clone())
            .header(REFERER, self.proxy.referer.as_str())
            .header(USER_AGENT, self.proxy.user_agent.as_str())
            .send()
            .await
            .map_err(|e| upstream_error(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            logger::log_warning(&format!("Upstream {url} answered {status}"));
            return Err(ProxyError::BadGateway(format!(
                "upstream status {}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| OCTET_STREAM.to_string(), ToString::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| upstream_error(&url, &e))?;

        Ok(ProxiedImage {
            body,
            content_type,
            source: ImageSource::Upstream(url),
        })
    }
}

/// Transport failure, with the error's source chain in the message
fn upstream_error(url: &Url, err: &reqwest::Error) -> ProxyError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    logger::log_warning(&format!("Upstream fetch failed for {url}: {message}"));
    ProxyError::BadGateway(message)
}
